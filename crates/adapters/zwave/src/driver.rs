//! Driver contract for a Z-Wave controller.
//!
//! The technology layer never talks to hardware directly; it drives this
//! trait and consumes its notification stream. A serial `OpenZWave` binding
//! and the in-process [`SimulatedDriver`](crate::simulator::SimulatedDriver)
//! both fit behind it.

use async_trait::async_trait;
use tokio::sync::broadcast;

use domo_domain::channel::NewChannel;
use domo_domain::device::NewDevice;

use crate::address::ValueAddress;
use crate::error::ZWaveError;

/// Asynchronous event reported by the controller.
///
/// Notifications are fanned out over a broadcast channel; a slow subscriber
/// may observe `Lagged` and miss intermediate value changes, never additions
/// it re-reads from the store.
#[derive(Debug, Clone)]
pub enum ZWaveNotification {
    /// A node completed inclusion and reported its manufacturer data.
    NodeAdded { device: NewDevice },
    /// A node exposed a new channel (command-class value).
    ValueAdded { channel: NewChannel },
    /// A channel reported a new value.
    ValueChanged { value_id: String, value: String },
    /// A node left the network (exclusion or hard reset).
    NodeRemoved { node_id: i64 },
}

/// Command surface of a Z-Wave controller.
#[async_trait]
pub trait ZWaveDriver: Send + Sync {
    /// Open the controller connection.
    async fn connect(&self) -> Result<(), ZWaveError>;

    /// Close the controller connection, cancelling any pending inclusion.
    async fn disconnect(&self) -> Result<(), ZWaveError>;

    /// Put the controller into inclusion mode and resolve when a node
    /// joined. `secure` requests S0/S2 key exchange during inclusion.
    async fn add_node(&self, secure: bool) -> Result<(), ZWaveError>;

    /// Cancel a pending inclusion or exclusion.
    async fn cancel(&self) -> Result<(), ZWaveError>;

    /// Put the controller into exclusion mode and resolve when a node left.
    async fn remove_node(&self) -> Result<(), ZWaveError>;

    /// Reset the controller. `hard` wipes the network, soft restarts the
    /// stack and keeps it.
    async fn reset(&self, hard: bool) -> Result<(), ZWaveError>;

    /// Write a value to the channel at `address`.
    async fn set_value(&self, address: &ValueAddress, value: &str) -> Result<(), ZWaveError>;

    /// Subscribe to the controller's notification stream.
    fn subscribe(&self) -> broadcast::Receiver<ZWaveNotification>;
}
