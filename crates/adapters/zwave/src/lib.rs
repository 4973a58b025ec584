//! # domo-adapter-zwave
//!
//! Z-Wave technology adapter. Bridges a controller driver into the system:
//! the `openzwave` endpoint exposes `pair`/`reset`/`unpair`, `set` writes a
//! channel value, and a background task consumes driver notifications and
//! mirrors them into the schema tables.
//!
//! ## How device state flows
//!
//! | Controller notification | Persisted as |
//! |-------------------------|--------------|
//! | `NodeAdded`             | `Device` row (by `node_id`) |
//! | `ValueAdded`            | `Channel` row plus a mirror `Object` keyed by `value_id` |
//! | `ValueChanged`          | `Channel.value` and the mirror object's value (`StateChanged` event) |
//! | `NodeRemoved`           | device, channels and mirror objects removed |
//!
//! ## Dependency rule
//!
//! Depends on `domo-app` (port traits) and `domo-domain` only.

pub mod address;
pub mod driver;
mod error;
pub mod simulator;

pub use error::ZWaveError;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use domo_app::ports::{Endpoint, OPENZWAVE_ENDPOINT, Technology, TechnologyContext};
use domo_domain::addressable::ZWAVE_TECHNOLOGY;
use domo_domain::channel::NewChannel;
use domo_domain::error::DomoError;
use domo_domain::id::WidgetId;
use domo_domain::object::NewObject;

use crate::address::ValueAddress;
use crate::driver::{ZWaveDriver, ZWaveNotification};

/// Inclusion and exclusion wait for a button press on the device; give the
/// operator a couple of minutes.
const INCLUSION_TIMEOUT: Duration = Duration::from_secs(120);

/// Object status recorded alongside driver-reported values.
const STATUS_ALIVE: i64 = 1;

/// The Z-Wave technology, dispatched by the `"zwave"` family name.
pub struct ZWaveTechnology {
    driver: Arc<dyn ZWaveDriver>,
    operation_timeout: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ZWaveTechnology {
    /// Create the technology over the given controller driver.
    #[must_use]
    pub fn new(driver: Arc<dyn ZWaveDriver>) -> Self {
        Self {
            driver,
            operation_timeout: INCLUSION_TIMEOUT,
            task: Mutex::new(None),
        }
    }

    /// Override the per-operation time budget.
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Technology for ZWaveTechnology {
    fn family(&self) -> &str {
        ZWAVE_TECHNOLOGY
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(self.operation_timeout)
    }

    async fn start(&self, context: Arc<dyn TechnologyContext>) -> Result<(), DomoError> {
        // Subscribe before connecting so startup notifications are not lost.
        let receiver = self.driver.subscribe();
        self.driver
            .connect()
            .await
            .map_err(ZWaveError::into_domain)?;

        let handle = tokio::spawn(notification_loop(receiver, context));
        if let Some(previous) = self.lock_task().replace(handle) {
            previous.abort();
        }

        tracing::info!("Z-Wave controller connected");
        Ok(())
    }

    async fn stop(&self) -> Result<(), DomoError> {
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
            tracing::debug!("notification task aborted");
        }
        self.driver
            .disconnect()
            .await
            .map_err(ZWaveError::into_domain)?;

        tracing::info!("Z-Wave controller disconnected");
        Ok(())
    }

    fn endpoint(&self, name: &str) -> Option<Arc<dyn Endpoint>> {
        (name == OPENZWAVE_ENDPOINT).then(|| {
            Arc::new(OpenZWaveEndpoint {
                driver: Arc::clone(&self.driver),
            }) as Arc<dyn Endpoint>
        })
    }

    async fn set(&self, address: &str, value: Value) -> Result<(), DomoError> {
        let parsed: ValueAddress = address
            .parse()
            .map_err(|err| ZWaveError::Address(err).into_domain())?;

        self.driver
            .set_value(&parsed, &render_value(&value))
            .await
            .map_err(ZWaveError::into_domain)
    }
}

/// The controller-level endpoint the `pair`/`reset`/`unpair` events reach.
struct OpenZWaveEndpoint {
    driver: Arc<dyn ZWaveDriver>,
}

#[async_trait]
impl Endpoint for OpenZWaveEndpoint {
    async fn pair(&self, secure: bool) -> Result<(), DomoError> {
        self.driver
            .add_node(secure)
            .await
            .map_err(ZWaveError::into_domain)
    }

    async fn reset(&self, hard: bool) -> Result<(), DomoError> {
        self.driver
            .reset(hard)
            .await
            .map_err(ZWaveError::into_domain)
    }

    async fn unpair(&self) -> Result<(), DomoError> {
        self.driver
            .remove_node()
            .await
            .map_err(ZWaveError::into_domain)
    }
}

/// Channel values travel as strings; JSON strings drop their quotes.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// The mirror object a discovered channel is exposed through.
fn mirror_object(channel: &NewChannel) -> NewObject {
    let label = if channel.name.is_empty() {
        channel.value_id.clone()
    } else {
        channel.name.clone()
    };

    NewObject {
        name: format!("Node {} {label}", channel.node_id),
        description: String::new(),
        kind: channel.kind.clone(),
        status: STATUS_ALIVE,
        value: channel.value.clone(),
        widget_id: WidgetId::UNASSIGNED,
        options: Value::Null,
        technology: ZWAVE_TECHNOLOGY.to_string(),
        technology_id: Some(channel.value_id.clone()),
        enabled: true,
        // System-genre channels (battery, configuration) stay off dashboards.
        visible: channel.genre != "system",
        protected: false,
    }
}

async fn notification_loop(
    mut receiver: broadcast::Receiver<ZWaveNotification>,
    context: Arc<dyn TechnologyContext>,
) {
    loop {
        match receiver.recv().await {
            Ok(notification) => {
                if let Err(err) = apply_notification(context.as_ref(), notification).await {
                    tracing::warn!(error = %err, "failed to persist controller notification");
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "notification stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn apply_notification(
    context: &dyn TechnologyContext,
    notification: ZWaveNotification,
) -> Result<(), DomoError> {
    match notification {
        ZWaveNotification::NodeAdded { device } => {
            tracing::info!(node_id = device.node_id, "node included");
            context.upsert_device(device).await?;
        }
        ZWaveNotification::ValueAdded { channel } => {
            let mirror = mirror_object(&channel);
            context.upsert_channel(channel).await?;
            context.upsert_object(mirror).await?;
        }
        ZWaveNotification::ValueChanged { value_id, value } => {
            context
                .update_channel_value(&value_id, value.clone())
                .await?;
            context
                .update_object_value(ZWAVE_TECHNOLOGY, &value_id, value, STATUS_ALIVE)
                .await?;
        }
        ZWaveNotification::NodeRemoved { node_id } => {
            tracing::info!(node_id, "node excluded");
            context.remove_node(node_id).await?;
        }
    }
    Ok(())
}
