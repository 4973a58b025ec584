//! # domo-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `domo-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `domo-app` (for port traits) and `domo-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod channel_repo;
pub mod device_repo;
pub mod error;
pub mod object_repo;
pub mod pool;
pub mod relation_repo;
pub mod technology_type_repo;
pub mod widget_repo;

pub use channel_repo::SqliteChannelRepository;
pub use device_repo::SqliteDeviceRepository;
pub use error::StorageError;
pub use object_repo::SqliteObjectRepository;
pub use pool::{Config, Database};
pub use relation_repo::SqliteRelationRepository;
pub use technology_type_repo::SqliteTechnologyTypeRepository;
pub use widget_repo::SqliteWidgetRepository;
