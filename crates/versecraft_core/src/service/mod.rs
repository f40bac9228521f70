//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation and repository calls into lifecycle APIs.
//! - Keep callers decoupled from storage and oracle details.

pub mod poem_service;
