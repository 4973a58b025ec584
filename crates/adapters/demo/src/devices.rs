//! Simulated demo devices — switch, dimmer, thermometer.
//!
//! Each device keeps its state in memory and knows its fixed technology id,
//! so the mirror objects stay stable across restarts.

use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use domo_domain::error::{DomoError, ValidationError};
use domo_domain::object::{NewObject, Object};

use crate::DEMO_TECHNOLOGY;

pub const SWITCH_ID: &str = "demo-switch-1";
pub const DIMMER_ID: &str = "demo-dimmer-1";
pub const THERMOMETER_ID: &str = "demo-thermometer-1";

/// A switch that is either on or off.
#[derive(Default)]
pub struct DemoSwitch {
    on: Mutex<bool>,
}

impl DemoSwitch {
    /// Mirror object for this switch in its current state.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the builder rejects the draft.
    pub fn discover(&self) -> Result<NewObject, DomoError> {
        Object::builder()
            .name("Demo switch")
            .kind("bool")
            .value(render_switch(self.snapshot()))
            .technology(DEMO_TECHNOLOGY)
            .technology_id(SWITCH_ID)
            .build()
    }

    /// Apply a written value, returning the canonical stored form.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the value is not a boolean.
    pub fn apply(&self, value: &Value) -> Result<String, DomoError> {
        let on = parse_switch(value)?;
        *self.on.lock().unwrap_or_else(PoisonError::into_inner) = on;
        Ok(render_switch(on))
    }

    fn snapshot(&self) -> bool {
        *self.on.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A dimmer holding a level between 0 and 100.
#[derive(Default)]
pub struct DemoDimmer {
    level: Mutex<i64>,
}

impl DemoDimmer {
    /// Mirror object for this dimmer in its current state.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the builder rejects the draft.
    pub fn discover(&self) -> Result<NewObject, DomoError> {
        Object::builder()
            .name("Demo dimmer")
            .kind("level")
            .value(self.snapshot().to_string())
            .technology(DEMO_TECHNOLOGY)
            .technology_id(DIMMER_ID)
            .build()
    }

    /// Apply a written level, clamped to `0..=100`, returning the canonical
    /// stored form.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the value is not an integer.
    pub fn apply(&self, value: &Value) -> Result<String, DomoError> {
        let level = parse_level(value)?.clamp(0, 100);
        *self.level.lock().unwrap_or_else(PoisonError::into_inner) = level;
        Ok(level.to_string())
    }

    fn snapshot(&self) -> i64 {
        *self.level.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A read-only thermometer; its reading follows a slow sine wave around
/// room temperature so dashboards have something moving to show.
#[derive(Default)]
pub struct DemoThermometer;

impl DemoThermometer {
    const MIDPOINT: f64 = 21.0;
    const AMPLITUDE: f64 = 1.5;
    /// One full cycle every ten minutes.
    const PERIOD_SECS: f64 = 600.0;

    /// Mirror object for this thermometer with a fresh reading.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the builder rejects the draft.
    pub fn discover(&self) -> Result<NewObject, DomoError> {
        Object::builder()
            .name("Demo thermometer")
            .kind("decimal")
            .value(Self::reading())
            .technology(DEMO_TECHNOLOGY)
            .technology_id(THERMOMETER_ID)
            .build()
    }

    /// Current simulated temperature, one decimal place.
    #[must_use]
    pub fn reading() -> String {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        let phase = since_epoch / Self::PERIOD_SECS * std::f64::consts::TAU;
        let value = Self::MIDPOINT + Self::AMPLITUDE * phase.sin();
        format!("{value:.1}")
    }
}

fn parse_switch(value: &Value) -> Result<bool, DomoError> {
    match value {
        Value::Bool(on) => Ok(*on),
        Value::String(text) => match text.to_ascii_lowercase().as_str() {
            "on" | "true" => Ok(true),
            "off" | "false" => Ok(false),
            _ => Err(ValidationError::InvalidPayload("set").into()),
        },
        _ => Err(ValidationError::InvalidPayload("set").into()),
    }
}

fn render_switch(on: bool) -> String {
    if on { "on" } else { "off" }.to_string()
}

fn parse_level(value: &Value) -> Result<i64, DomoError> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| ValidationError::InvalidPayload("set").into()),
        Value::String(text) => text
            .parse()
            .map_err(|_| ValidationError::InvalidPayload("set").into()),
        _ => Err(ValidationError::InvalidPayload("set").into()),
    }
}
