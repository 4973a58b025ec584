//! # domo-adapter-demo
//!
//! Demo technology — three simulated devices for demos and tests, no
//! hardware required.
//!
//! ## Provided devices
//!
//! | Device | Technology id | Behaviour |
//! |--------|---------------|-----------|
//! | Demo switch | `demo-switch-1` | `set` accepts `on`/`off`/booleans |
//! | Demo dimmer | `demo-dimmer-1` | `set` accepts a level, clamped to 0–100 |
//! | Demo thermometer | `demo-thermometer-1` | Read-only; refreshed by a background tick |
//!
//! ## Dependency rule
//!
//! Depends on `domo-app` (port traits) and `domo-domain` only.

pub mod devices;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinHandle;

use domo_app::ports::{Endpoint, Technology, TechnologyContext};
use domo_domain::error::{DomoError, NotFoundError};

use crate::devices::{
    DIMMER_ID, DemoDimmer, DemoSwitch, DemoThermometer, SWITCH_ID, THERMOMETER_ID,
};

/// Family name this technology is dispatched by.
pub const DEMO_TECHNOLOGY: &str = "demo";

/// Object status recorded alongside simulated values.
const STATUS_OK: i64 = 1;

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

struct Runtime {
    context: Option<Arc<dyn TechnologyContext>>,
    task: Option<JoinHandle<()>>,
}

/// The demo technology, dispatched by the `"demo"` family name.
pub struct DemoTechnology {
    switch: DemoSwitch,
    dimmer: DemoDimmer,
    thermometer: DemoThermometer,
    tick_interval: Duration,
    runtime: Mutex<Runtime>,
}

impl Default for DemoTechnology {
    fn default() -> Self {
        Self {
            switch: DemoSwitch::default(),
            dimmer: DemoDimmer::default(),
            thermometer: DemoThermometer,
            tick_interval: DEFAULT_TICK_INTERVAL,
            runtime: Mutex::new(Runtime {
                context: None,
                task: None,
            }),
        }
    }
}

impl DemoTechnology {
    /// Override the sensor refresh interval.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    fn lock_runtime(&self) -> std::sync::MutexGuard<'_, Runtime> {
        self.runtime.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn context(&self) -> Result<Arc<dyn TechnologyContext>, DomoError> {
        self.lock_runtime()
            .context
            .clone()
            .ok_or_else(|| DomoError::TechnologyUnavailable {
                technology: DEMO_TECHNOLOGY.to_string(),
                state: "stopped".to_string(),
            })
    }
}

#[async_trait]
impl Technology for DemoTechnology {
    fn family(&self) -> &str {
        DEMO_TECHNOLOGY
    }

    async fn start(&self, context: Arc<dyn TechnologyContext>) -> Result<(), DomoError> {
        context.upsert_object(self.switch.discover()?).await?;
        context.upsert_object(self.dimmer.discover()?).await?;
        context.upsert_object(self.thermometer.discover()?).await?;

        let handle = tokio::spawn(tick_loop(self.tick_interval, Arc::clone(&context)));

        let mut runtime = self.lock_runtime();
        runtime.context = Some(context);
        if let Some(previous) = runtime.task.replace(handle) {
            previous.abort();
        }

        tracing::info!(devices = 3, "demo technology started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), DomoError> {
        let mut runtime = self.lock_runtime();
        runtime.context = None;
        if let Some(handle) = runtime.task.take() {
            handle.abort();
            tracing::debug!("sensor tick task aborted");
        }
        tracing::info!("demo technology stopped");
        Ok(())
    }

    fn endpoint(&self, _name: &str) -> Option<Arc<dyn Endpoint>> {
        None
    }

    async fn set(&self, address: &str, value: Value) -> Result<(), DomoError> {
        let context = self.context()?;
        let canonical = match address {
            SWITCH_ID => self.switch.apply(&value)?,
            DIMMER_ID => self.dimmer.apply(&value)?,
            THERMOMETER_ID => {
                tracing::debug!("ignoring write to read-only thermometer");
                return Ok(());
            }
            other => {
                return Err(NotFoundError {
                    entity: "Object",
                    id: other.to_string(),
                }
                .into());
            }
        };

        context
            .update_object_value(DEMO_TECHNOLOGY, address, canonical, STATUS_OK)
            .await?;
        Ok(())
    }
}

async fn tick_loop(interval: Duration, context: Arc<dyn TechnologyContext>) {
    loop {
        tokio::time::sleep(interval).await;
        let reading = DemoThermometer::reading();
        if let Err(err) = context
            .update_object_value(DEMO_TECHNOLOGY, THERMOMETER_ID, reading, STATUS_OK)
            .await
        {
            tracing::warn!(error = %err, "failed to refresh thermometer reading");
        }
    }
}
