//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema (scan allow-list, cache root,
//! peak resolution and UI/audio/log options) and helpers to load it from disk.

mod load;
mod schema;

pub use load::{default_cache_home, default_config_path, resolve_config_path};
pub use schema::*;

#[cfg(test)]
mod tests;
