//! Configuration loading and validation.

mod loader;
mod types;

pub use loader::{ConfigError, ConfigLoader};
pub use types::{Config, Monitor, WatchErrorPolicy};
