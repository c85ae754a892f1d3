//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions that are not commands
//! themselves, such as autocomplete.

/// Autocomplete handlers for item names and world names
pub mod autocomplete;
