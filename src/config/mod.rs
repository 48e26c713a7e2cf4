//! Configuration module for seekify
//!
//! Handles loading settings from YAML files and `SEEKIFY_*` environment variables.

mod settings;

pub use settings::*;
