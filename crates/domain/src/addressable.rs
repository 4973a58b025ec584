//! Shared capability for rows owned by a technology.
//!
//! The technology-specific tables (Z-Wave devices and channels) refine the
//! object concept by convention, not by schema inheritance: an object row
//! and its technology-specific counterpart share an identifying key
//! (`technologyID` / `nodeID` / `valueID`). [`Addressable`] is that
//! convention made explicit. Nothing keeps the rows in sync automatically;
//! reconciliation is the owning technology's responsibility.

/// Technology name assigned to objects not backed by any driver.
pub const CORE_TECHNOLOGY: &str = "Core";

/// Technology family name of the Z-Wave module.
pub const ZWAVE_TECHNOLOGY: &str = "zwave";

/// Capability shared by objects and the technology-specific rows that
/// refine them.
pub trait Addressable {
    /// Raw row id.
    fn addressable_id(&self) -> i64;

    /// Owning technology family ([`CORE_TECHNOLOGY`] when driver-less).
    fn technology(&self) -> &str;

    /// Technology-specific key used to reconcile rows across schemas.
    fn technology_key(&self) -> Option<String>;
}
