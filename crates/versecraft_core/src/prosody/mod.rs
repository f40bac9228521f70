//! Syllable counting.
//!
//! # Responsibility
//! - Load pronouncing dictionaries.
//! - Provide the deterministic estimator used as the authoritative fallback
//!   when the oracle cannot decide.

pub mod dictionary;
pub mod syllables;
