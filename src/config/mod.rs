//! Configuration loading and management.
//!
//! - [`types`]: Core config struct definitions (Config, StoreConfig, FilterConfig)
//! - [`validation`]: Startup checks returning every problem found

mod types;
mod validation;

pub use types::{Config, ConfigError, FilterConfig, StoreBackend, StoreConfig};
pub use validation::{ValidationError, validate};
