//! Device service — use-cases for managing discovered devices.

use domo_domain::device::{Device, DeviceFilter, NewDevice};
use domo_domain::error::{DomoError, NotFoundError};
use domo_domain::id::DeviceId;

use crate::ports::DeviceRepository;

/// Application service for device CRUD operations.
pub struct DeviceService<R> {
    devices: R,
}

impl<R: DeviceRepository> DeviceService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(devices: R) -> Self {
        Self { devices }
    }

    /// Create a new device after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if invariants fail, or a storage
    /// error propagated from the repository.
    #[tracing::instrument(skip(self, device), fields(node_id = device.node_id))]
    pub async fn create_device(&self, device: NewDevice) -> Result<Device, DomoError> {
        device.validate()?;
        self.devices.create(device).await
    }

    /// Look up a device by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] when no device with `id` exists, or
    /// a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_device(&self, id: DeviceId) -> Result<Device, DomoError> {
        self.devices.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all devices.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_devices(&self) -> Result<Vec<Device>, DomoError> {
        self.devices.get_all().await
    }

    /// List devices matching every set field of `filter`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn find_devices(&self, filter: DeviceFilter) -> Result<Vec<Device>, DomoError> {
        self.devices.find(filter).await
    }

    /// Update an existing device.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if invariants fail, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id))]
    pub async fn update_device(&self, device: Device) -> Result<Device, DomoError> {
        device.validate()?;
        self.devices.update(device).await
    }

    /// Create or update a device by its network `node_id`.
    ///
    /// If a device with the same node id already exists, its descriptive
    /// fields are refreshed (preserving the store id). Otherwise a new
    /// device is created.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if invariants fail, or a storage
    /// error propagated from the repository.
    #[tracing::instrument(skip(self, device), fields(node_id = device.node_id))]
    pub async fn upsert_device(&self, device: NewDevice) -> Result<Device, DomoError> {
        device.validate()?;
        if let Some(existing) = self.devices.get_by_node_id(device.node_id).await? {
            let updated = device.into_device(existing.id);
            return self.devices.update(updated).await;
        }
        self.devices.create(device).await
    }

    /// Delete a device by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_device(&self, id: DeviceId) -> Result<(), DomoError> {
        self.devices.delete(id).await
    }

    /// Delete the device with the given network node id, if any.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_by_node(&self, node_id: i64) -> Result<(), DomoError> {
        self.devices.delete_by_node_id(node_id).await
    }
}
