//! Channel — a single reported value of a Z-Wave device.
//!
//! Every value the controller exposes (a switch state, a temperature
//! reading, a configuration parameter) is one channel. The `value_id` is
//! the controller-assigned address in `node-class-instance-index` form and
//! is the key objects reconcile against.

use serde::{Deserialize, Serialize};

use crate::addressable::{Addressable, ZWAVE_TECHNOLOGY};
use crate::error::{DomoError, ValidationError};
use crate::id::ChannelId;

/// A persisted channel row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    /// Controller-assigned value address, `node-class-instance-index`.
    pub value_id: String,
    pub name: String,
    pub value: String,
    /// Allowed values for list-typed channels.
    pub values: Vec<String>,
    pub min_value: i64,
    pub max_value: i64,
    pub node_id: i64,
    /// Z-Wave command class of the value.
    pub class_id: i64,
    pub genre: String,
    pub kind: String,
    pub instance: i64,
    pub index: i64,
    pub units: String,
    pub read_only: bool,
    pub write_only: bool,
    pub polled: bool,
}

impl Channel {
    #[must_use]
    pub fn builder() -> ChannelBuilder {
        ChannelBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when `value_id` is empty.
    pub fn validate(&self) -> Result<(), DomoError> {
        if self.value_id.is_empty() {
            return Err(ValidationError::EmptyValueId.into());
        }
        Ok(())
    }
}

impl Addressable for Channel {
    fn addressable_id(&self) -> i64 {
        self.id.as_i64()
    }

    fn technology(&self) -> &str {
        ZWAVE_TECHNOLOGY
    }

    fn technology_key(&self) -> Option<String> {
        Some(self.value_id.clone())
    }
}

/// Field payload for a channel that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChannel {
    pub value_id: String,
    pub name: String,
    pub value: String,
    pub values: Vec<String>,
    pub min_value: i64,
    pub max_value: i64,
    pub node_id: i64,
    pub class_id: i64,
    pub genre: String,
    pub kind: String,
    pub instance: i64,
    pub index: i64,
    pub units: String,
    pub read_only: bool,
    pub write_only: bool,
    pub polled: bool,
}

impl NewChannel {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when `value_id` is empty.
    pub fn validate(&self) -> Result<(), DomoError> {
        if self.value_id.is_empty() {
            return Err(ValidationError::EmptyValueId.into());
        }
        Ok(())
    }

    /// Attach the store-assigned id, producing a persisted [`Channel`].
    #[must_use]
    pub fn into_channel(self, id: ChannelId) -> Channel {
        Channel {
            id,
            value_id: self.value_id,
            name: self.name,
            value: self.value,
            values: self.values,
            min_value: self.min_value,
            max_value: self.max_value,
            node_id: self.node_id,
            class_id: self.class_id,
            genre: self.genre,
            kind: self.kind,
            instance: self.instance,
            index: self.index,
            units: self.units,
            read_only: self.read_only,
            write_only: self.write_only,
            polled: self.polled,
        }
    }
}

#[derive(Debug, Default)]
pub struct ChannelBuilder {
    value_id: Option<String>,
    name: Option<String>,
    value: Option<String>,
    values: Option<Vec<String>>,
    min_value: Option<i64>,
    max_value: Option<i64>,
    node_id: Option<i64>,
    class_id: Option<i64>,
    genre: Option<String>,
    kind: Option<String>,
    instance: Option<i64>,
    index: Option<i64>,
    units: Option<String>,
    read_only: Option<bool>,
    write_only: Option<bool>,
    polled: Option<bool>,
}

impl ChannelBuilder {
    #[must_use]
    pub fn value_id(mut self, value_id: impl Into<String>) -> Self {
        self.value_id = Some(value_id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn values(mut self, values: Vec<String>) -> Self {
        self.values = Some(values);
        self
    }

    #[must_use]
    pub fn min_value(mut self, min_value: i64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    #[must_use]
    pub fn max_value(mut self, max_value: i64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    #[must_use]
    pub fn node_id(mut self, node_id: i64) -> Self {
        self.node_id = Some(node_id);
        self
    }

    #[must_use]
    pub fn class_id(mut self, class_id: i64) -> Self {
        self.class_id = Some(class_id);
        self
    }

    #[must_use]
    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn instance(mut self, instance: i64) -> Self {
        self.instance = Some(instance);
        self
    }

    #[must_use]
    pub fn index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    #[must_use]
    pub fn write_only(mut self, write_only: bool) -> Self {
        self.write_only = Some(write_only);
        self
    }

    #[must_use]
    pub fn polled(mut self, polled: bool) -> Self {
        self.polled = Some(polled);
        self
    }

    /// Consume the builder, apply field defaults, validate, and return a
    /// [`NewChannel`].
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if `value_id` is missing or empty.
    pub fn build(self) -> Result<NewChannel, DomoError> {
        let channel = NewChannel {
            value_id: self.value_id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            value: self.value.unwrap_or_default(),
            values: self.values.unwrap_or_default(),
            min_value: self.min_value.unwrap_or_default(),
            max_value: self.max_value.unwrap_or_default(),
            node_id: self.node_id.unwrap_or_default(),
            class_id: self.class_id.unwrap_or_default(),
            genre: self.genre.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            instance: self.instance.unwrap_or(1),
            index: self.index.unwrap_or_default(),
            units: self.units.unwrap_or_default(),
            read_only: self.read_only.unwrap_or_default(),
            write_only: self.write_only.unwrap_or_default(),
            polled: self.polled.unwrap_or_default(),
        };
        channel.validate()?;
        Ok(channel)
    }
}

/// Attribute filter for channel queries; `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct ChannelFilter {
    pub value_id: Option<String>,
    pub node_id: Option<i64>,
    pub class_id: Option<i64>,
    pub genre: Option<String>,
    pub kind: Option<String>,
}

impl ChannelFilter {
    /// Whether `channel` satisfies every set field of this filter.
    #[must_use]
    pub fn matches(&self, channel: &Channel) -> bool {
        self.value_id
            .as_ref()
            .is_none_or(|v| *v == channel.value_id)
            && self.node_id.is_none_or(|v| v == channel.node_id)
            && self.class_id.is_none_or(|v| v == channel.class_id)
            && self.genre.as_ref().is_none_or(|v| *v == channel.genre)
            && self.kind.as_ref().is_none_or(|v| *v == channel.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_apply_defaults_when_building_minimal_channel() {
        let channel = Channel::builder().value_id("5-49-1-1").build().unwrap();
        assert_eq!(channel.value_id, "5-49-1-1");
        assert_eq!(channel.instance, 1);
        assert_eq!(channel.index, 0);
        assert!(!channel.read_only);
    }

    #[test]
    fn should_return_validation_error_when_value_id_is_missing() {
        let result = Channel::builder().name("Temperature").build();
        assert!(matches!(
            result,
            Err(DomoError::Validation(ValidationError::EmptyValueId))
        ));
    }

    #[test]
    fn should_address_channel_by_value_id() {
        let channel = Channel::builder()
            .value_id("2-37-1-0")
            .node_id(2)
            .class_id(37)
            .build()
            .unwrap()
            .into_channel(ChannelId::new(8));
        assert_eq!(channel.technology(), "zwave");
        assert_eq!(channel.technology_key(), Some("2-37-1-0".to_string()));
    }

    #[test]
    fn should_match_filter_by_node_and_class() {
        let channel = Channel::builder()
            .value_id("2-37-1-0")
            .node_id(2)
            .class_id(37)
            .build()
            .unwrap()
            .into_channel(ChannelId::new(1));

        let filter = ChannelFilter {
            node_id: Some(2),
            class_id: Some(37),
            ..ChannelFilter::default()
        };
        assert!(filter.matches(&channel));

        let filter = ChannelFilter {
            class_id: Some(38),
            ..ChannelFilter::default()
        };
        assert!(!filter.matches(&channel));
    }
}
