//! Technology port — the runtime contract a pluggable driver module exposes.
//!
//! A technology bridges a device protocol (Z-Wave, BLE, a demo simulator)
//! into the system. The registry drives its lifecycle, the dispatcher routes
//! named events to it, and the technology persists what it discovers through
//! the [`TechnologyContext`] handed to [`Technology::start`].
//!
//! These traits are object-safe (`async_trait`) on purpose: the registry
//! stores heterogeneous technologies behind `Arc<dyn Technology>`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use domo_domain::channel::{Channel, NewChannel};
use domo_domain::device::{Device, NewDevice};
use domo_domain::error::DomoError;
use domo_domain::event::Event;
use domo_domain::object::{NewObject, Object};

/// Endpoint name the device-level `pair`/`reset`/`unpair` events delegate to.
pub const OPENZWAVE_ENDPOINT: &str = "openzwave";

/// A pluggable technology driver module.
#[async_trait]
pub trait Technology: Send + Sync {
    /// Family name this technology is dispatched by (e.g. `"zwave"`).
    fn family(&self) -> &str;

    /// Time budget for a single dispatched operation on this technology.
    ///
    /// `None` defers to the dispatcher's configured default. Slow protocols
    /// (Z-Wave inclusion can take minutes) override this.
    fn default_timeout(&self) -> Option<Duration> {
        None
    }

    /// Bring the driver up.
    ///
    /// Devices, channels and objects discovered during startup (and later,
    /// from background notifications) are persisted through `context`.
    /// Returning an error marks the technology `Failed`.
    async fn start(&self, context: Arc<dyn TechnologyContext>) -> Result<(), DomoError>;

    /// Shut the driver down, cancelling in-flight device operations.
    async fn stop(&self) -> Result<(), DomoError>;

    /// Look up a named endpoint; `None` when this technology does not
    /// implement it.
    fn endpoint(&self, name: &str) -> Option<Arc<dyn Endpoint>>;

    /// Write a value to an address in the technology's own notation.
    async fn set(&self, address: &str, value: Value) -> Result<(), DomoError>;
}

/// A named capability exposed by a running technology.
///
/// Every operation resolves when the driver reports completion. Driver
/// failures surface as [`DomoError::Endpoint`]
/// ([`EndpointError`](domo_domain::error::EndpointError)).
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Include a new device into the network.
    async fn pair(&self, secure: bool) -> Result<(), DomoError>;

    /// Reset the controller; `hard` wipes it, soft restarts it.
    async fn reset(&self, hard: bool) -> Result<(), DomoError>;

    /// Exclude a device from the network.
    async fn unpair(&self) -> Result<(), DomoError>;
}

/// Context provided to technologies for persisting discoveries.
///
/// This is a **port** — driver adapters call it to mirror device state into
/// the schema tables and onto the event bus. `ServiceContext` in
/// `crate::services::context` implements it over the application services.
#[async_trait]
pub trait TechnologyContext: Send + Sync {
    /// Persist a discovered object (create or update by
    /// `technology` + `technology_id`).
    async fn upsert_object(&self, object: NewObject) -> Result<Object, DomoError>;

    /// Record a reported value change on the object reconciled by
    /// `technology` + `technology_id`, publishing a `StateChanged` event.
    async fn update_object_value(
        &self,
        technology: &str,
        technology_id: &str,
        value: String,
        status: i64,
    ) -> Result<Object, DomoError>;

    /// Persist a discovered device (create or update by `node_id`).
    async fn upsert_device(&self, device: NewDevice) -> Result<Device, DomoError>;

    /// Persist a discovered channel (create or update by `value_id`).
    async fn upsert_channel(&self, channel: NewChannel) -> Result<Channel, DomoError>;

    /// Record a reported value on the channel row addressed by `value_id`.
    async fn update_channel_value(&self, value_id: &str, value: String)
    -> Result<Channel, DomoError>;

    /// Remove a device, its channels, and their mirror objects after the
    /// node left the network.
    async fn remove_node(&self, node_id: i64) -> Result<(), DomoError>;

    /// Publish a domain event to the event bus.
    async fn publish(&self, event: Event) -> Result<(), DomoError>;
}
