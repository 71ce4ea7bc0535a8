//! Domain model for Harmony life areas.
//!
//! # Responsibility
//! - Define the canonical records stored per life domain.
//! - Define the change-event and impact-analysis types exchanged with the
//!   impact engine.
//!
//! # Invariants
//! - Every stored record is identified by a stable `i64` id assigned by the
//!   store on insert.
//! - Progress values are percentages in `0..=100`.

pub mod change;
pub mod entity;
