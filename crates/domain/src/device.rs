//! Device — a physical Z-Wave node discovered on the network.
//!
//! Devices mirror what the controller reports during inclusion. They exist
//! so channels have a parent to hang off and so the UI can show manufacturer
//! data; the addressable key of a device is its network node id.

use serde::{Deserialize, Serialize};

use crate::addressable::{Addressable, ZWAVE_TECHNOLOGY};
use crate::error::{DomoError, ValidationError};
use crate::id::DeviceId;

/// A persisted device row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    /// Z-Wave network node id, positive.
    pub node_id: i64,
    pub name: String,
    pub description: String,
    pub product: String,
    pub product_type: String,
    pub product_id: String,
    pub manufacturer: String,
    pub manufacturer_id: String,
}

impl Device {
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when `node_id` is not positive.
    pub fn validate(&self) -> Result<(), DomoError> {
        if self.node_id <= 0 {
            return Err(ValidationError::InvalidNodeId.into());
        }
        Ok(())
    }
}

impl Addressable for Device {
    fn addressable_id(&self) -> i64 {
        self.id.as_i64()
    }

    fn technology(&self) -> &str {
        ZWAVE_TECHNOLOGY
    }

    fn technology_key(&self) -> Option<String> {
        Some(self.node_id.to_string())
    }
}

/// Field payload for a device that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDevice {
    pub node_id: i64,
    pub name: String,
    pub description: String,
    pub product: String,
    pub product_type: String,
    pub product_id: String,
    pub manufacturer: String,
    pub manufacturer_id: String,
}

impl NewDevice {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when `node_id` is not positive.
    pub fn validate(&self) -> Result<(), DomoError> {
        if self.node_id <= 0 {
            return Err(ValidationError::InvalidNodeId.into());
        }
        Ok(())
    }

    /// Attach the store-assigned id, producing a persisted [`Device`].
    #[must_use]
    pub fn into_device(self, id: DeviceId) -> Device {
        Device {
            id,
            node_id: self.node_id,
            name: self.name,
            description: self.description,
            product: self.product,
            product_type: self.product_type,
            product_id: self.product_id,
            manufacturer: self.manufacturer,
            manufacturer_id: self.manufacturer_id,
        }
    }
}

#[derive(Debug, Default)]
pub struct DeviceBuilder {
    node_id: Option<i64>,
    name: Option<String>,
    description: Option<String>,
    product: Option<String>,
    product_type: Option<String>,
    product_id: Option<String>,
    manufacturer: Option<String>,
    manufacturer_id: Option<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn node_id(mut self, node_id: i64) -> Self {
        self.node_id = Some(node_id);
        self
    }

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
    pub fn product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    #[must_use]
    pub fn product_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = Some(product_type.into());
        self
    }

    #[must_use]
    pub fn product_id(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    #[must_use]
    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    #[must_use]
    pub fn manufacturer_id(mut self, manufacturer_id: impl Into<String>) -> Self {
        self.manufacturer_id = Some(manufacturer_id.into());
        self
    }

    /// Consume the builder, apply field defaults, validate, and return a
    /// [`NewDevice`].
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if `node_id` is missing or not
    /// positive.
    pub fn build(self) -> Result<NewDevice, DomoError> {
        let device = NewDevice {
            node_id: self.node_id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            product: self.product.unwrap_or_default(),
            product_type: self.product_type.unwrap_or_default(),
            product_id: self.product_id.unwrap_or_default(),
            manufacturer: self.manufacturer.unwrap_or_default(),
            manufacturer_id: self.manufacturer_id.unwrap_or_default(),
        };
        device.validate()?;
        Ok(device)
    }
}

/// Attribute filter for device queries; `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub node_id: Option<i64>,
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl DeviceFilter {
    /// Whether `device` satisfies every set field of this filter.
    #[must_use]
    pub fn matches(&self, device: &Device) -> bool {
        self.node_id.is_none_or(|v| v == device.node_id)
            && self.name.as_ref().is_none_or(|v| *v == device.name)
            && self
                .manufacturer
                .as_ref()
                .is_none_or(|v| *v == device.manufacturer)
            && self.product.as_ref().is_none_or(|v| *v == device.product)
    }
}
