//! Domain events published on the internal bus.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{EventId, ObjectId};
use crate::time::{self, Timestamp};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ObjectCreated,
    ObjectRemoved,
    StateChanged,
    TechnologyStateChanged,
}

/// An event as published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    /// Object the event concerns, when it concerns one.
    pub object_id: Option<ObjectId>,
    /// Event-type specific payload.
    pub data: Value,
    pub at: Timestamp,
}

impl Event {
    #[must_use]
    pub fn new(event_type: EventType, object_id: Option<ObjectId>, data: Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            object_id,
            data,
            at: time::now(),
        }
    }
}
