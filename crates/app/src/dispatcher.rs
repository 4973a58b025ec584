//! Event dispatcher — routes named events to technology handlers.
//!
//! One dispatcher instance serves the whole process. `dispatch` itself never
//! blocks: it resolves the handler, spawns it onto the runtime bounded by
//! the configured timeout, and hands back a ticket. Callers that care about
//! the outcome await the ticket; everyone else gets fire-and-forget
//! semantics with failures logged as dispatch errors.

pub mod handlers;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;

use domo_domain::addressable::CORE_TECHNOLOGY;
use domo_domain::error::{DispatchError, DomoError, NotFoundError, ValidationError};
use domo_domain::trigger::{TECHNOLOGY_EVENT, TechnologyPayload, Trigger};

use crate::ports::TechnologyTypeRepository;
use crate::registry::{Routed, TechnologyHandle, TechnologyRegistry};

/// Boxed future returned by an event handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), DomoError>> + Send>>;

/// An event handler: receives the resolved technology handle and the
/// trigger envelope.
pub type Handler = Arc<dyn Fn(TechnologyHandle, Trigger) -> HandlerFuture + Send + Sync>;

/// Outcome of a dispatch call.
#[derive(Debug)]
pub enum Dispatch {
    /// The handler is running; await the ticket for its result, or drop it
    /// for fire-and-forget.
    Pending(DispatchTicket),
    /// The technology is not running; the trigger was queued and will be
    /// redelivered once it starts.
    Queued,
}

/// Claim on the result of a dispatched handler.
#[derive(Debug)]
pub struct DispatchTicket {
    technology: String,
    event: String,
    receiver: oneshot::Receiver<Result<(), DomoError>>,
}

impl DispatchTicket {
    /// Await the handler outcome.
    ///
    /// # Errors
    ///
    /// Returns the handler's own error, or [`DomoError::Cancelled`] when
    /// the handler task went away without reporting.
    pub async fn wait(self) -> Result<(), DomoError> {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(DomoError::Cancelled {
                technology: self.technology,
                operation: self.event,
            }),
        }
    }
}

/// Step-by-step builder for [`Dispatcher`].
///
/// The handler table is immutable once built; technologies contribute their
/// handlers at composition time.
pub struct DispatcherBuilder<TR> {
    registry: TechnologyRegistry<TR>,
    handlers: HashMap<(String, String), Handler>,
    timeout: Duration,
}

impl<TR> DispatcherBuilder<TR> {
    /// Create a builder around the given registry, with a 30 second
    /// handler timeout.
    #[must_use]
    pub fn new(registry: TechnologyRegistry<TR>) -> Self {
        Self {
            registry,
            handlers: HashMap::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Bound dispatched handlers by `timeout`, unless the technology
    /// declares its own.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a handler for `event` on the `family` technology.
    #[must_use]
    pub fn handler<F>(mut self, family: &str, event: &str, handler: F) -> Self
    where
        F: Fn(TechnologyHandle, Trigger) -> HandlerFuture + Send + Sync + 'static,
    {
        self.handlers
            .insert((family.to_owned(), event.to_owned()), Arc::new(handler));
        self
    }

    /// Finish the builder.
    #[must_use]
    pub fn build(self) -> Dispatcher<TR> {
        Dispatcher {
            inner: Arc::new(Inner {
                registry: self.registry,
                handlers: self.handlers,
                timeout: self.timeout,
            }),
        }
    }
}

struct Inner<TR> {
    registry: TechnologyRegistry<TR>,
    handlers: HashMap<(String, String), Handler>,
    timeout: Duration,
}

/// Process-wide event dispatcher.
///
/// Cheaply cloneable; clones share the handler table and registry.
pub struct Dispatcher<TR> {
    inner: Arc<Inner<TR>>,
}

impl<TR> Clone for Dispatcher<TR> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<TR> Dispatcher<TR>
where
    TR: TechnologyTypeRepository + Send + Sync + 'static,
{
    /// Parse a raw wire envelope and dispatch it.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when the envelope has no `sType`,
    /// plus everything [`dispatch`](Self::dispatch) can return.
    pub fn trigger(&self, envelope: Value) -> Result<Dispatch, DomoError> {
        let trigger: Trigger = serde_json::from_value(envelope)
            .map_err(|_| ValidationError::InvalidPayload("trigger"))?;
        self.dispatch(trigger)
    }

    /// Route a trigger to its handler.
    ///
    /// Lookup failures (unknown event, unknown action, unknown technology)
    /// fail fast here; handler failures surface asynchronously through the
    /// returned ticket and the error log.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::UnknownEvent`] when no handler is registered
    /// for the event, [`DomoError::UnknownAction`] for an unrecognized core
    /// action, [`DomoError::NotFound`] for an unknown technology family,
    /// and [`DomoError::TechnologyUnavailable`] when the target's trigger
    /// queue is full.
    pub fn dispatch(&self, trigger: Trigger) -> Result<Dispatch, DomoError> {
        if trigger.event == TECHNOLOGY_EVENT {
            return self.dispatch_core(trigger);
        }

        let Some(family) = trigger.technology_id.clone() else {
            // Not the core lifecycle event and no target: nobody handles it.
            return Err(DomoError::UnknownEvent {
                technology: CORE_TECHNOLOGY.to_owned(),
                event: trigger.event,
            });
        };
        if !self.inner.registry.contains(&family) {
            return Err(NotFoundError {
                entity: "Technology",
                id: family,
            }
            .into());
        }
        let key = (family.clone(), trigger.event.clone());
        let Some(handler) = self.inner.handlers.get(&key) else {
            return Err(DomoError::UnknownEvent {
                technology: family,
                event: trigger.event,
            });
        };

        match self.inner.registry.route(&family, trigger)? {
            Routed::Queued => Ok(Dispatch::Queued),
            Routed::Ready { handle, trigger } => Ok(Dispatch::Pending(self.spawn_handler(
                Arc::clone(handler),
                handle,
                trigger,
            ))),
        }
    }

    /// Stop every installed technology. Called on process shutdown.
    pub async fn shutdown(&self) {
        self.inner.registry.stop_all().await;
    }

    /// Handle the core `technology` lifecycle event.
    fn dispatch_core(&self, trigger: Trigger) -> Result<Dispatch, DomoError> {
        let payload: TechnologyPayload = trigger
            .payload()
            .map_err(|_| ValidationError::InvalidPayload(TECHNOLOGY_EVENT))?;
        let subject = trigger
            .technology_id
            .clone()
            .ok_or(ValidationError::InvalidPayload(TECHNOLOGY_EVENT))?;
        match payload.action.as_str() {
            "start" => Ok(Dispatch::Pending(self.spawn_lifecycle(subject, true))),
            "stop" => Ok(Dispatch::Pending(self.spawn_lifecycle(subject, false))),
            _ => Err(DomoError::UnknownAction {
                technology: subject,
                action: payload.action,
            }),
        }
    }

    fn spawn_lifecycle(&self, family: String, start: bool) -> DispatchTicket {
        let (tx, rx) = oneshot::channel();
        let ticket = DispatchTicket {
            technology: family.clone(),
            event: TECHNOLOGY_EVENT.to_owned(),
            receiver: rx,
        };
        let dispatcher = self.clone();
        tokio::spawn(async move {
            // Lifecycle calls carry their own timeout inside the registry.
            let outcome = if start {
                match dispatcher.inner.registry.start(&family).await {
                    Ok(queued) => {
                        dispatcher.redeliver(queued);
                        Ok(())
                    }
                    Err(source) => Err(source),
                }
            } else {
                dispatcher.inner.registry.stop(&family).await
            };
            let outcome = outcome.map_err(|source| {
                let report = DispatchError {
                    event: TECHNOLOGY_EVENT.to_owned(),
                    technology: family,
                    source,
                };
                tracing::error!(error = %report, "dispatch failed");
                report.into_source()
            });
            let _ = tx.send(outcome);
        });
        ticket
    }

    fn spawn_handler(
        &self,
        handler: Handler,
        handle: TechnologyHandle,
        trigger: Trigger,
    ) -> DispatchTicket {
        let (tx, rx) = oneshot::channel();
        let family = handle.family().to_owned();
        let event = trigger.event.clone();
        let ticket = DispatchTicket {
            technology: family.clone(),
            event: event.clone(),
            receiver: rx,
        };
        let timeout = handle.default_timeout().unwrap_or(self.inner.timeout);
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, handler(handle, trigger)).await {
                Ok(result) => result,
                Err(_) => Err(DomoError::Cancelled {
                    technology: family.clone(),
                    operation: event.clone(),
                }),
            };
            let outcome = outcome.map_err(|source| {
                let report = DispatchError {
                    event,
                    technology: family,
                    source,
                };
                tracing::error!(error = %report, "dispatch failed");
                report.into_source()
            });
            // The receiver may be gone: dispatch is fire-and-forget unless
            // the caller kept the ticket.
            let _ = tx.send(outcome);
        });
        ticket
    }

    /// Redeliver triggers that were queued while a technology was down.
    fn redeliver(&self, queued: Vec<Trigger>) {
        for trigger in queued {
            let event = trigger.event.clone();
            match self.dispatch(trigger) {
                // Ticket dropped on purpose: redelivery is fire-and-forget.
                Ok(_) => {}
                Err(error) => {
                    tracing::error!(event, error = %error, "redelivery of queued trigger failed");
                }
            }
        }
    }
}
