//! TOML config file loading and creation.

mod loader;
mod paths;
mod template;


pub use loader::{load, load_from_path};
pub use paths::{create_default_config, default_config_path, resolve_config_path};
