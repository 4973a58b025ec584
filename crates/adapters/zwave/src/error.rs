//! Z-Wave adapter error types.

use domo_domain::addressable::ZWAVE_TECHNOLOGY;
use domo_domain::error::{DomoError, EndpointError};

use crate::address::AddressParseError;

/// Errors specific to the Z-Wave driver layer.
#[derive(Debug, thiserror::Error)]
pub enum ZWaveError {
    /// The controller connection is down; no command can be sent.
    #[error("controller is not running")]
    NotRunning,

    /// A value address string could not be parsed.
    #[error("invalid value address")]
    Address(#[from] AddressParseError),

    /// The network has no channel at the given address.
    #[error("no channel at address {address}")]
    UnknownValue { address: String },
}

impl ZWaveError {
    /// Wrap into a [`DomoError::Endpoint`] attributed to the `openzwave`
    /// endpoint of the `zwave` technology.
    #[must_use]
    pub fn into_domain(self) -> DomoError {
        EndpointError {
            technology: ZWAVE_TECHNOLOGY.to_string(),
            endpoint: domo_app::ports::OPENZWAVE_ENDPOINT.to_string(),
            source: Box::new(self),
        }
        .into()
    }
}

impl From<ZWaveError> for DomoError {
    fn from(err: ZWaveError) -> Self {
        err.into_domain()
    }
}
