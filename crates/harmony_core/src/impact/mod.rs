//! Change-propagation and impact-analysis subsystem.
//!
//! # Responsibility
//! - Map a change event to an impact summary (`engine`).
//! - Hold the static change-tag rule table (`rules`).
//! - Apply suggested adjustments as real store mutations (`adjust`).
//!
//! # Invariants
//! - Analysis is total: every change event yields an `ImpactAnalysis`,
//!   degrading to the rule table on any model or store failure.
//! - Nothing in this module persists analysis results.

pub mod adjust;
pub mod engine;
pub mod rules;
