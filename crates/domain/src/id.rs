//! Typed identifier newtypes backed by `i64` row ids.
//!
//! Every persisted table keys its rows with an integer primary key assigned
//! by the store, so the newtypes wrap `i64` rather than generating their own
//! values. Bus events are not table rows and keep a random UUID identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw row id.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Access the raw row id.
            #[must_use]
            pub const fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Unique identifier for an [`Object`](crate::object::Object).
    ObjectId
);

define_id!(
    /// Unique identifier for a [`Widget`](crate::widget::Widget).
    WidgetId
);

define_id!(
    /// Unique identifier for a [`Relation`](crate::relation::Relation).
    RelationId
);

define_id!(
    /// Unique identifier for a [`TechnologyType`](crate::technology_type::TechnologyType) row.
    TechnologyTypeId
);

define_id!(
    /// Unique identifier for a Z-Wave [`Device`](crate::device::Device) row.
    DeviceId
);

define_id!(
    /// Unique identifier for a Z-Wave [`Channel`](crate::channel::Channel) row.
    ChannelId
);

define_id!(
    /// Identifier of an addressable node in the relation graph.
    ///
    /// Relation endpoints live in a shared namespace: a `NodeId` may name an
    /// object or a widget, and validation accepts it when either table knows
    /// the id.
    NodeId
);

impl WidgetId {
    /// Sentinel for an object that is not assigned to any widget.
    pub const UNASSIGNED: Self = Self(-1);

    /// Whether this id is the unassigned sentinel.
    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        self.0 == Self::UNASSIGNED.0
    }
}

impl From<ObjectId> for NodeId {
    fn from(id: ObjectId) -> Self {
        Self(id.0)
    }
}

impl From<WidgetId> for NodeId {
    fn from(id: WidgetId) -> Self {
        Self(id.0)
    }
}

/// Unique identifier for a bus [`Event`](crate::event::Event).
///
/// Events are never table rows, so they keep a random UUID identity instead
/// of a store-assigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(uuid::Uuid);

impl Default for EventId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl EventId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
