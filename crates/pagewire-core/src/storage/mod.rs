mod config;
pub mod database;

pub use config::{
    Config, IntroConfig, MenuConfig, ModalConfig, PageConfig, PomodoroConfig, QuickHelpConfig,
    RevealConfig,
};
pub use database::SqliteStore;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{CoreError, StorageError};

/// Small persistent flags and counters (the page's `localStorage`).
pub trait KeyValueStore {
    fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn kv_set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Non-persistent store, lost with the page.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn kv_set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Returns `~/.config/pagewire[-dev]/` based on PAGEWIRE_ENV.
///
/// Set PAGEWIRE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("PAGEWIRE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pagewire-dev")
    } else {
        base_dir.join("pagewire")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
