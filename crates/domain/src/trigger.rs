//! Trigger — the wire envelope carried from transports into the dispatcher.
//!
//! A trigger names an event (`sType`), optionally the technology family it
//! is aimed at (`sTechnologyID`), and carries every remaining field of the
//! incoming JSON object untouched. Handlers deserialize the fields they
//! care about through [`Trigger::payload`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event name of the built-in technology lifecycle trigger.
pub const TECHNOLOGY_EVENT: &str = "technology";

/// An incoming event envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    /// Event name, e.g. `"pair"`, `"set"`, `"technology"`.
    #[serde(rename = "sType")]
    pub event: String,
    /// Technology family the trigger addresses; `None` targets the core.
    #[serde(rename = "sTechnologyID", default)]
    pub technology_id: Option<String>,
    /// Remaining envelope fields, kept verbatim for the handler.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Trigger {
    #[must_use]
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            technology_id: None,
            data: Map::new(),
        }
    }

    #[must_use]
    pub fn with_technology(mut self, technology_id: impl Into<String>) -> Self {
        self.technology_id = Some(technology_id.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Deserialize the envelope fields into a typed payload view.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] when mandatory payload
    /// fields are missing or have the wrong shape.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.data.clone()))
    }
}

/// Payload of a `pair` trigger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PairPayload {
    /// Whether to include the node with network security.
    #[serde(rename = "bSecure", default)]
    pub secure: bool,
}

/// Payload of a `reset` trigger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResetPayload {
    /// Hard reset wipes the controller, soft reset restarts it.
    #[serde(rename = "bHardReset", default)]
    pub hard: bool,
}

/// Payload of a `set` trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPayload {
    /// Address of the value to write, in the technology's own notation.
    pub msp: String,
    /// New value, passed through to the driver untyped.
    pub value: Value,
}

/// Payload of the built-in [`TECHNOLOGY_EVENT`] trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnologyPayload {
    /// Lifecycle action to perform, e.g. `"start"`.
    #[serde(rename = "sAction")]
    pub action: String,
}
