use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum TransportError {
    #[error("Channel Closed: {message} {location}")]
    Closed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Send Error: {message} {location}")]
    Send {
        message: String,
        location: ErrorLocation,
    },

    #[error("Read Error: {message} {location}")]
    Read {
        message: String,
        location: ErrorLocation,
    },

    #[error("Handshake Error: {message} {location}")]
    Handshake {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid Url: {message} {location}")]
    InvalidUrl {
        message: String,
        location: ErrorLocation,
    },
}
