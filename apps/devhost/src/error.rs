use bridge_core::error::BridgeError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error;

/// Errors surfaced by the development host.
///
/// Bridge failures are flattened to their display form at this boundary;
/// the structured variants live in `bridge-core` and the host only needs
/// to report them.
#[derive(Debug, Error)]
pub enum HostError {
    /// Error from this host (logging setup, demo wiring)
    #[error("Host Error: {message} {location}")]
    Host {
        message: String,
        location: ErrorLocation,
    },

    /// Error from a bridge operation
    #[error("Bridge Error: {message} {location}")]
    Bridge {
        message: String,
        location: ErrorLocation,
    },
}

impl From<BridgeError> for HostError {
    #[track_caller]
    fn from(error: BridgeError) -> Self {
        HostError::Bridge {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
