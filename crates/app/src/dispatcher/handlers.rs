//! Built-in event handlers shared by device technologies.
//!
//! Pairing flows go through the technology's `openzwave` endpoint; `set`
//! goes straight to the driver. Technologies that need different behavior
//! register their own handlers instead of these.

use std::sync::Arc;

use domo_domain::error::ValidationError;
use domo_domain::trigger::{PairPayload, ResetPayload, SetPayload, Trigger};

use crate::ports::OPENZWAVE_ENDPOINT;
use crate::registry::TechnologyHandle;

use super::{DispatcherBuilder, HandlerFuture};

/// `pair` — put the controller in inclusion mode.
pub fn endpoint_pair(handle: TechnologyHandle, trigger: Trigger) -> HandlerFuture {
    Box::pin(async move {
        let payload: PairPayload = trigger
            .payload()
            .map_err(|_| ValidationError::InvalidPayload("pair"))?;
        handle.endpoint(OPENZWAVE_ENDPOINT)?.pair(payload.secure).await
    })
}

/// `reset` — reset the controller, soft unless `bHardReset` is set.
pub fn endpoint_reset(handle: TechnologyHandle, trigger: Trigger) -> HandlerFuture {
    Box::pin(async move {
        let payload: ResetPayload = trigger
            .payload()
            .map_err(|_| ValidationError::InvalidPayload("reset"))?;
        handle.endpoint(OPENZWAVE_ENDPOINT)?.reset(payload.hard).await
    })
}

/// `unpair` — put the controller in exclusion mode.
pub fn endpoint_unpair(handle: TechnologyHandle, _trigger: Trigger) -> HandlerFuture {
    Box::pin(async move { handle.endpoint(OPENZWAVE_ENDPOINT)?.unpair().await })
}

/// `set` — write a value to the address named by `msp`.
pub fn direct_set(handle: TechnologyHandle, trigger: Trigger) -> HandlerFuture {
    Box::pin(async move {
        let payload: SetPayload = trigger
            .payload()
            .map_err(|_| ValidationError::InvalidPayload("set"))?;
        handle.set(&payload.msp, payload.value).await
    })
}

/// Wire the standard device-level handlers for a technology family.
#[must_use]
pub fn register_device_handlers<TR>(
    builder: DispatcherBuilder<TR>,
    family: &str,
) -> DispatcherBuilder<TR> {
    builder
        .handler(family, "pair", endpoint_pair)
        .handler(family, "reset", endpoint_reset)
        .handler(family, "set", direct_set)
        .handler(family, "unpair", endpoint_unpair)
}
