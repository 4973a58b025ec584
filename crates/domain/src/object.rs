//! Object — the generic addressable entity shared by every technology.
//!
//! An object represents a single addressable logical entity: a sensor
//! channel, an actuator, or a virtual item. Technology modules create
//! objects for the values they expose and keep `value`/`status` current as
//! the driver reports changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::addressable::{Addressable, CORE_TECHNOLOGY};
use crate::error::{DomoError, ValidationError};
use crate::id::{ObjectId, WidgetId};

/// A persisted object row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Object {
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    /// Semantic kind of the object (`"switch"`, `"sensor"`, …).
    pub kind: String,
    pub status: i64,
    pub value: String,
    /// Widget this object belongs to; [`WidgetId::UNASSIGNED`] when none.
    pub widget_id: WidgetId,
    pub options: Value,
    /// Owning technology family; `"Core"` for driver-less objects.
    pub technology: String,
    /// Technology-specific key (for Z-Wave objects: the channel `valueID`).
    pub technology_id: Option<String>,
    pub enabled: bool,
    pub visible: bool,
    pub protected: bool,
}

impl Object {
    /// Create a builder for constructing a [`NewObject`].
    #[must_use]
    pub fn builder() -> ObjectBuilder {
        ObjectBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), DomoError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

impl Addressable for Object {
    fn addressable_id(&self) -> i64 {
        self.id.as_i64()
    }

    fn technology(&self) -> &str {
        &self.technology
    }

    fn technology_key(&self) -> Option<String> {
        self.technology_id.clone()
    }
}

/// Field payload for an object that has not been persisted yet.
///
/// The store assigns the id on create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewObject {
    pub name: String,
    pub description: String,
    pub kind: String,
    pub status: i64,
    pub value: String,
    pub widget_id: WidgetId,
    pub options: Value,
    pub technology: String,
    pub technology_id: Option<String>,
    pub enabled: bool,
    pub visible: bool,
    pub protected: bool,
}

impl NewObject {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), DomoError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// Attach the store-assigned id, producing a persisted [`Object`].
    #[must_use]
    pub fn into_object(self, id: ObjectId) -> Object {
        Object {
            id,
            name: self.name,
            description: self.description,
            kind: self.kind,
            status: self.status,
            value: self.value,
            widget_id: self.widget_id,
            options: self.options,
            technology: self.technology,
            technology_id: self.technology_id,
            enabled: self.enabled,
            visible: self.visible,
            protected: self.protected,
        }
    }
}

/// Step-by-step builder for [`NewObject`].
#[derive(Debug, Default)]
pub struct ObjectBuilder {
    name: Option<String>,
    description: Option<String>,
    kind: Option<String>,
    status: Option<i64>,
    value: Option<String>,
    widget_id: Option<WidgetId>,
    options: Option<Value>,
    technology: Option<String>,
    technology_id: Option<String>,
    enabled: Option<bool>,
    visible: Option<bool>,
    protected: Option<bool>,
}

impl ObjectBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: i64) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn widget_id(mut self, widget_id: WidgetId) -> Self {
        self.widget_id = Some(widget_id);
        self
    }

    #[must_use]
    pub fn options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    #[must_use]
    pub fn technology(mut self, technology: impl Into<String>) -> Self {
        self.technology = Some(technology.into());
        self
    }

    #[must_use]
    pub fn technology_id(mut self, technology_id: impl Into<String>) -> Self {
        self.technology_id = Some(technology_id.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    #[must_use]
    pub fn protected(mut self, protected: bool) -> Self {
        self.protected = Some(protected);
        self
    }

    /// Consume the builder, apply field defaults, validate, and return a
    /// [`NewObject`].
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<NewObject, DomoError> {
        let object = NewObject {
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            value: self.value.unwrap_or_default(),
            widget_id: self.widget_id.unwrap_or(WidgetId::UNASSIGNED),
            options: self.options.unwrap_or(Value::Null),
            technology: self
                .technology
                .unwrap_or_else(|| CORE_TECHNOLOGY.to_string()),
            technology_id: self.technology_id,
            enabled: self.enabled.unwrap_or(true),
            visible: self.visible.unwrap_or(true),
            protected: self.protected.unwrap_or(false),
        };
        object.validate()?;
        Ok(object)
    }
}

/// Attribute filter for object queries; `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct ObjectFilter {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub status: Option<i64>,
    pub value: Option<String>,
    pub widget_id: Option<WidgetId>,
    pub technology: Option<String>,
    pub technology_id: Option<String>,
    pub enabled: Option<bool>,
    pub visible: Option<bool>,
    pub protected: Option<bool>,
}

impl ObjectFilter {
    /// Whether `object` satisfies every set field of this filter.
    #[must_use]
    pub fn matches(&self, object: &Object) -> bool {
        self.name.as_ref().is_none_or(|v| *v == object.name)
            && self.kind.as_ref().is_none_or(|v| *v == object.kind)
            && self.status.is_none_or(|v| v == object.status)
            && self.value.as_ref().is_none_or(|v| *v == object.value)
            && self.widget_id.is_none_or(|v| v == object.widget_id)
            && self
                .technology
                .as_ref()
                .is_none_or(|v| *v == object.technology)
            && self
                .technology_id
                .as_ref()
                .is_none_or(|v| object.technology_id.as_ref() == Some(v))
            && self.enabled.is_none_or(|v| v == object.enabled)
            && self.visible.is_none_or(|v| v == object.visible)
            && self.protected.is_none_or(|v| v == object.protected)
    }
}
