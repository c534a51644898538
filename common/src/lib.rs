//! Shared data types for Transom.
//!
//! This crate contains pure data structures passed between the bridge core
//! and its hosts. Types here have no business logic - they're just data
//! that can cross crate boundaries.
//!
//! ## Architecture
//!
//! - **common** (this crate): Pure data structures
//! - **bridge-core**: Protocol logic operating on these types
//! - **devhost**: Application wiring everything together
//!
//! This layered architecture keeps concerns separated and makes testing easier.

pub mod error;
pub mod handle;
pub mod page;

pub use error::error_location::ErrorLocation;
pub use handle::HandleId;
pub use page::Page;

#[cfg(test)]
mod tests;
