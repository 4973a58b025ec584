//! Widget — a grouping container for objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomoError, ValidationError};
use crate::id::WidgetId;

/// A persisted widget row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    pub id: WidgetId,
    pub name: String,
    /// Rendering model hint (`"switch"`, `"gauge"`, …).
    pub model: String,
    pub options: Value,
    pub visible: bool,
    pub protected: bool,
}

impl Widget {
    #[must_use]
    pub fn builder() -> WidgetBuilder {
        WidgetBuilder::default()
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

/// Field payload for a widget that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWidget {
    pub name: String,
    pub model: String,
    pub options: Value,
    pub visible: bool,
    pub protected: bool,
}

impl NewWidget {
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

    /// Attach the store-assigned id, producing a persisted [`Widget`].
    #[must_use]
    pub fn into_widget(self, id: WidgetId) -> Widget {
        Widget {
            id,
            name: self.name,
            model: self.model,
            options: self.options,
            visible: self.visible,
            protected: self.protected,
        }
    }
}

#[derive(Debug, Default)]
pub struct WidgetBuilder {
    name: Option<String>,
    model: Option<String>,
    options: Option<Value>,
    visible: Option<bool>,
    protected: Option<bool>,
}

impl WidgetBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn options(mut self, options: Value) -> Self {
        self.options = Some(options);
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
    /// [`NewWidget`].
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<NewWidget, DomoError> {
        let widget = NewWidget {
            name: self.name.unwrap_or_default(),
            model: self.model.unwrap_or_default(),
            options: self.options.unwrap_or(Value::Null),
            visible: self.visible.unwrap_or(true),
            protected: self.protected.unwrap_or(false),
        };
        widget.validate()?;
        Ok(widget)
    }
}

/// Attribute filter for widget queries; `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct WidgetFilter {
    pub name: Option<String>,
    pub model: Option<String>,
    pub visible: Option<bool>,
    pub protected: Option<bool>,
}

impl WidgetFilter {
    /// Whether `widget` satisfies every set field of this filter.
    #[must_use]
    pub fn matches(&self, widget: &Widget) -> bool {
        self.name.as_ref().is_none_or(|v| *v == widget.name)
            && self.model.as_ref().is_none_or(|v| *v == widget.model)
            && self.visible.is_none_or(|v| v == widget.visible)
            && self.protected.is_none_or(|v| v == widget.protected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_apply_defaults_when_building_minimal_widget() {
        let widget = Widget::builder().name("Living Room").build().unwrap();
        assert_eq!(widget.name, "Living Room");
        assert!(widget.model.is_empty());
        assert!(widget.visible);
        assert!(!widget.protected);
    }

    #[test]
    fn should_return_validation_error_when_name_is_missing() {
        let result = Widget::builder().model("gauge").build();
        assert!(matches!(
            result,
            Err(DomoError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_match_filter_on_set_fields_only() {
        let widget = Widget::builder()
            .name("Bedroom")
            .model("switch")
            .build()
            .unwrap()
            .into_widget(WidgetId::new(2));

        let filter = WidgetFilter {
            model: Some("switch".to_string()),
            ..WidgetFilter::default()
        };
        assert!(filter.matches(&widget));

        let filter = WidgetFilter {
            name: Some("Kitchen".to_string()),
            ..WidgetFilter::default()
        };
        assert!(!filter.matches(&widget));
    }
}
