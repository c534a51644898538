pub mod bridge;
pub mod transport;

pub use bridge::BridgeError;
pub use transport::TransportError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Bridge(#[from] bridge::BridgeError),

    #[error(transparent)]
    Transport(#[from] transport::TransportError),
}
