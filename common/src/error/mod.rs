pub mod error_location;

pub use error_location::ErrorLocation;
