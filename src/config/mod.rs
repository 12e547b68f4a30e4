//! # geodict Configuration Module
//!
//! This module centralizes all configuration constants for geodict. Constants
//! are grouped by their functional area and interdependencies are documented
//! and enforced through compile-time assertions.
//!
//! Runtime settings (page size overrides for tests, cache capacity, trie
//! cutoff, alias rules) live in [`crate::build::BuildOptions`].
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric configuration values with dependency documentation

pub mod constants;
pub use constants::*;
