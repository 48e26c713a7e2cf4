//! Search backends
//!
//! Defines the Backend trait, the registry of built-in backends and their
//! implementations for each category.

mod registry;
mod traits;
pub mod utils;

// Backend implementations
pub mod annasarchive;
pub mod bing;
pub mod brave;
pub mod duckduckgo;
pub mod google;
pub mod grokipedia;
pub mod mojeek;
pub mod wikipedia;
pub mod yahoo;
pub mod youtube;

pub use registry::{BackendFactory, Registry, TEXT_PRIORITY_KEYS};
pub use traits::*;
