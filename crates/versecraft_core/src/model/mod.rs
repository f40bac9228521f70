//! Domain model for collaborative poems.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep form contracts as typed values instead of ad-hoc criteria blobs.
//!
//! # Invariants
//! - Every poem and contribution is identified by a stable UUID.
//! - Contributions are immutable once accepted.

pub mod form;
pub mod poem;
pub mod verdict;
