//! # domod — domo daemon
//!
//! Composition root that wires all adapters together and runs the event
//! dispatcher.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env vars)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct application services, injecting repositories via port traits
//! - Install the enabled technologies and start them through the dispatcher
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use domo_adapter_demo::{DEMO_TECHNOLOGY, DemoTechnology};
use domo_adapter_storage_sqlite_sqlx::{
    SqliteChannelRepository, SqliteDeviceRepository, SqliteObjectRepository,
    SqliteTechnologyTypeRepository, SqliteWidgetRepository,
};
use domo_adapter_zwave::ZWaveTechnology;
use domo_adapter_zwave::simulator::SimulatedDriver;
use domo_app::dispatcher::{Dispatch, DispatcherBuilder, handlers};
use domo_app::event_bus::InProcessEventBus;
use domo_app::registry::TechnologyRegistry;
use domo_app::services::channel_service::ChannelService;
use domo_app::services::context::ServiceContext;
use domo_app::services::device_service::DeviceService;
use domo_app::services::object_service::ObjectService;
use domo_domain::addressable::ZWAVE_TECHNOLOGY;
use domo_domain::trigger::{TECHNOLOGY_EVENT, Trigger};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database
    let db = domo_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Repositories
    let object_repo = SqliteObjectRepository::new(pool.clone());
    let widget_repo = SqliteWidgetRepository::new(pool.clone());
    let device_repo = SqliteDeviceRepository::new(pool.clone());
    let channel_repo = SqliteChannelRepository::new(pool.clone());
    let technology_type_repo = SqliteTechnologyTypeRepository::new(pool);

    // Event bus
    let event_bus = InProcessEventBus::new(256);

    // Services
    let object_service = Arc::new(ObjectService::new(
        object_repo,
        widget_repo,
        event_bus.clone(),
    ));
    let device_service = Arc::new(DeviceService::new(device_repo));
    let channel_service = Arc::new(ChannelService::new(channel_repo));
    let context = Arc::new(ServiceContext::new(
        object_service,
        device_service,
        channel_service,
        event_bus,
    ));

    // Registry
    let registry = TechnologyRegistry::new(
        technology_type_repo,
        context,
        config.dispatch.queue_limit,
        config.dispatch_timeout(),
    );

    let mut enabled = Vec::new();
    if config.technologies.zwave {
        let driver = Arc::new(SimulatedDriver::default());
        registry.install(Arc::new(ZWaveTechnology::new(driver)))?;
        registry
            .register(ZWAVE_TECHNOLOGY, "rust", "domo-adapter-zwave")
            .await?;
        enabled.push(ZWAVE_TECHNOLOGY);
    }
    if config.technologies.demo {
        registry.install(Arc::new(DemoTechnology::default()))?;
        registry
            .register(DEMO_TECHNOLOGY, "rust", "domo-adapter-demo")
            .await?;
        enabled.push(DEMO_TECHNOLOGY);
    }

    // Dispatcher. Z-Wave gets the full pairing surface; the demo
    // technology has no endpoint and only handles writes.
    let mut builder = DispatcherBuilder::new(registry).timeout(config.dispatch_timeout());
    if config.technologies.zwave {
        builder = handlers::register_device_handlers(builder, ZWAVE_TECHNOLOGY);
    }
    if config.technologies.demo {
        builder = builder.handler(DEMO_TECHNOLOGY, "set", handlers::direct_set);
    }
    let dispatcher = builder.build();

    // Start the enabled technologies through the same path external
    // triggers take.
    for family in &enabled {
        let start = Trigger::new(TECHNOLOGY_EVENT)
            .with_technology(*family)
            .with_field("sAction", json!("start"));
        if let Dispatch::Pending(ticket) = dispatcher.dispatch(start)? {
            ticket.wait().await?;
        }
    }

    tracing::info!(technologies = ?enabled, "domod running");

    shutdown_signal().await?;
    tracing::info!("shutting down");
    dispatcher.shutdown().await;

    Ok(())
}

/// Resolve once SIGINT or SIGTERM is received.
async fn shutdown_signal() -> std::io::Result<()> {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = sigterm.recv() => Ok(()),
    }
}
