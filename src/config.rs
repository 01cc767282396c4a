// src/config.rs

//! Configuration for the bridge and the window it creates.
//!
//! The structs deserialize from JSON. Every field has a default, so a config
//! file only needs to name the values it overrides. The file is located via
//! the `X11_BRIDGE_CONFIG` environment variable; without it the defaults are
//! used as-is.

use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::channel::FATAL_MESSAGE_CAPACITY;

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_ENV: &str = "X11_BRIDGE_CONFIG";

/// Process-wide configuration, loaded on first access.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);

// --- Top-Level Configuration Structure ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// The window the bridge creates.
    pub window: WindowConfig,
    /// Polling cadence and channel sizing.
    pub bridge: BridgeConfig,
}

impl Config {
    /// Loads the config from `$X11_BRIDGE_CONFIG`, falling back to defaults.
    pub fn load() -> Self {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from(PathBuf::from(path)),
            None => {
                info!("{} not set, using default configuration.", CONFIG_PATH_ENV);
                Self::default()
            }
        }
    }

    /// Loads the config from `path`. Unreadable or malformed files are logged
    /// and replaced by defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(
                    "Could not read config file {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                return Self::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(config) => {
                info!("Configuration loaded from {}.", path.display());
                config
            }
            Err(e) => {
                warn!(
                    "Malformed config file {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }
}

// --- Window Configuration ---

/// Parameters for the native window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Client area width in pixels.
    pub width: u32,
    /// Client area height in pixels.
    pub height: u32,
    /// Default position, relative to the root window. Window managers are free
    /// to ignore it.
    pub x: i32,
    pub y: i32,
    pub border_width: u32,
    /// X display name (e.g. ":1"). `None` uses `$DISPLAY`.
    pub display: Option<String>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "x11-event-bridge".to_string(),
            width: 800,
            height: 600,
            x: 10,
            y: 10,
            border_width: 1,
            display: None,
        }
    }
}

// --- Bridge Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// How long the bridge thread sleeps after a poll that found no event.
    pub poll_interval_ms: u64,
    /// Declared size of the channel's fatal message buffer.
    pub message_size: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            poll_interval_ms: 4,
            message_size: FATAL_MESSAGE_CAPACITY,
        }
    }
}

impl BridgeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
