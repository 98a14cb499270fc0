//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config sections and loading
//! - [`defaults`]: serde default functions
//! - [`permissions`]: per-command requirement table
//! - [`validation`]: startup checks

mod defaults;
mod permissions;
mod types;
pub mod validation;

pub use types::Config;

#[cfg(test)]
pub use permissions::COMMAND_KEYS;
