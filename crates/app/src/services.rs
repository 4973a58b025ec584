//! Application services — use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic
//! parameters (constructor injection), keeping this layer decoupled from
//! concrete adapters.

pub mod channel_service;
pub mod context;
pub mod device_service;
pub mod object_service;
pub mod widget_service;
