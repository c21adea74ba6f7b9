//! Configuration management for `NoSQLConn`
//!
//! This module provides the `ConfigManager` for loading and saving the
//! TOML application settings and the connection profiles file.

mod manager;
pub mod settings;

pub use manager::{CONFIG_DIR_ENV, ConfigManager};
pub use settings::{AppSettings, ConnectionTestSettings, LoggingSettings, ProfileDefaults};
