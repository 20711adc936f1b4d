//! Configuration Management
//!
//! Hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/autodoc/config.toml)
//! 3. Project config (./autodoc.toml)
//! 4. Environment variables (AUTODOC_*, OPENAI_API_KEY, OPENAI_MODEL)
//! 5. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
