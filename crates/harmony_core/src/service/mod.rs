//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate engine and repository calls into use-case level APIs.
//! - Keep callers decoupled from storage and model wiring.

pub mod change_service;
