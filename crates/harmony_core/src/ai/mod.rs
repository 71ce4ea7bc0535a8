//! Remote endpoint wrappers.
//!
//! # Responsibility
//! - Provide thin JSON-in/JSON-out wrappers over the Harmony worker endpoint.
//! - Expose the `TextModel` seam the impact engine depends on.

pub mod client;
