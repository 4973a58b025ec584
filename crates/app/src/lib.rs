//! # domo-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ObjectRepository`, `WidgetRepository`, `RelationRepository`,
//!     `TechnologyTypeRepository`, `DeviceRepository`, `ChannelRepository` —
//!     CRUD plus query-by-filter per table
//!   - `Technology` / `Endpoint` — the runtime contract a driver module exposes
//!   - `EventPublisher` — publish domain events
//! - Define **driving/inbound ports** as use-case structs:
//!   - `RelationGraph` — add/remove/walk the object relation graph
//!   - `TechnologyRegistry` — lifecycle of installed technologies
//!   - `Dispatcher` — route named events to technology handlers
//!   - entity services — validated CRUD over the schema tables
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `domo-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod event_bus;
pub mod graph;
pub mod ports;
pub mod registry;
pub mod services;
