mod error_location;
mod handle;
