//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`DomoError`]
//! via `#[from]`. Storage adapters box their error behind
//! [`DomoError::Storage`] so the domain never names a persistence crate.

use crate::id::NodeId;

/// Top-level error for every fallible core operation.
#[derive(Debug, thiserror::Error)]
pub enum DomoError {
    /// A domain invariant or not-null constraint was violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An operation addressed a row that does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A mutation addressed a protected row without the override flag.
    #[error(transparent)]
    Protected(#[from] ProtectedError),

    /// No handler is registered for this event name.
    #[error("unknown event {event:?} for technology {technology:?}")]
    UnknownEvent { technology: String, event: String },

    /// A core `technology` event carried an unrecognized action.
    #[error("unknown action {action:?} for technology {technology:?}")]
    UnknownAction { technology: String, action: String },

    /// The technology does not expose an endpoint with this name.
    #[error("technology {technology:?} has no endpoint {endpoint:?}")]
    UnknownEndpoint {
        technology: String,
        endpoint: String,
    },

    /// The technology is not in the `Running` state, or its event queue is
    /// full.
    #[error("technology {technology:?} is unavailable (state: {state})")]
    TechnologyUnavailable { technology: String, state: String },

    /// A driver-level failure surfaced through an endpoint.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// A dispatched operation was cancelled or exceeded its timeout.
    #[error("operation {operation:?} on technology {technology:?} was cancelled")]
    Cancelled {
        technology: String,
        operation: String,
    },

    /// A persistence-layer failure.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant or not-null constraint was violated.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// `name` is a required field on objects and widgets.
    #[error("name must not be empty")]
    EmptyName,

    /// `type` is a required field on technology records.
    #[error("technology type must not be empty")]
    EmptyTechnologyKind,

    /// `valueID` is a required field on channels.
    #[error("channel value id must not be empty")]
    EmptyValueId,

    /// Z-Wave node ids start at 1.
    #[error("device node id must be positive")]
    InvalidNodeId,

    /// An object referenced a widget id that does not exist.
    #[error("widget {0} does not exist")]
    UnknownWidget(crate::id::WidgetId),

    /// A relation endpoint named a node unknown to both the object and the
    /// widget tables.
    #[error("relation endpoint {0} does not exist")]
    UnknownNode(NodeId),

    /// A technology with this id is already installed in the registry.
    #[error("technology {0:?} is already installed")]
    DuplicateTechnology(String),

    /// An event envelope was missing or malformed for the named event.
    #[error("invalid payload for event {0:?}")]
    InvalidPayload(&'static str),
}

/// An operation addressed a row that does not exist.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Human-readable entity name (`"Object"`, `"Relation"`, …).
    pub entity: &'static str,
    /// The id that missed.
    pub id: String,
}

/// A mutation addressed a protected row without the override flag.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} is protected")]
pub struct ProtectedError {
    /// Human-readable entity name.
    pub entity: &'static str,
    /// The protected row's id.
    pub id: String,
}

/// A driver-level failure surfaced through a technology endpoint.
#[derive(Debug, thiserror::Error)]
#[error("endpoint {endpoint:?} of technology {technology:?} failed: {source}")]
pub struct EndpointError {
    /// Technology family the endpoint belongs to.
    pub technology: String,
    /// Endpoint name (`"openzwave"`, …).
    pub endpoint: String,
    /// The underlying driver error.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Logging wrapper for a failed dispatch.
///
/// The dispatcher formats this into its error log and then hands the
/// underlying error back to any caller awaiting the dispatch ticket.
#[derive(Debug, thiserror::Error)]
#[error("dispatch of {event:?} to technology {technology:?} failed: {source}")]
pub struct DispatchError {
    /// Event name that was being dispatched.
    pub event: String,
    /// Technology the event addressed (`"Core"` for core-level events).
    pub technology: String,
    /// The failure itself.
    #[source]
    pub source: DomoError,
}

impl DispatchError {
    /// Unwrap the underlying error after the wrapper has been logged.
    #[must_use]
    pub fn into_source(self) -> DomoError {
        self.source
    }
}
