//! # domo-domain
//!
//! Pure domain model for the domo home automation core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Objects** (the generic addressable entity: a sensor channel,
//!   an actuator, a virtual item)
//! - Define **Widgets** (UI-facing groupings of objects)
//! - Define **Relations** (directed, typed, event-tagged edges between
//!   addressable entities)
//! - Define **Technology records** (`TechnologyType` rows describing
//!   installable technology modules)
//! - Define the Z-Wave refinements (**Devices** and **Channels**) and the
//!   `Addressable` capability that reconciles them with objects
//! - Define **Triggers** (incoming named events) and **Events**
//!   (state-change records)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod addressable;
pub mod channel;
pub mod device;
pub mod event;
pub mod object;
pub mod relation;
pub mod technology_type;
pub mod trigger;
pub mod widget;
