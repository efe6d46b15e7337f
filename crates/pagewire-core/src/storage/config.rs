//! TOML-based page configuration.
//!
//! Holds every timing and threshold the page behaviours depend on:
//! - Overlay transitions (settle delay, frame delay, dismiss gestures)
//! - Menu breakpoint
//! - Scroll reveal threshold, margin and stagger
//! - Intro animation delays
//! - Pomodoro and quick-help timer lengths
//!
//! Configuration is stored at `~/.config/pagewire/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, CoreError};

/// Overlay manager configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalConfig {
    /// Must match the CSS transition duration of `.modal-overlay`.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Delay before the `active` class is applied (one animation frame).
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    #[serde(default = "default_true")]
    pub close_on_overlay_click: bool,
    #[serde(default = "default_true")]
    pub close_on_esc: bool,
    /// Register every `.modal-overlay` that has an id at install.
    #[serde(default = "default_true")]
    pub auto_register: bool,
}

/// Dropdown and mobile navigation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuConfig {
    #[serde(default = "default_mobile_breakpoint_px")]
    pub mobile_breakpoint_px: f64,
}

/// Scroll reveal configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Visible fraction needed to reveal an element.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Added to the viewport bottom edge (negative shrinks it).
    #[serde(default = "default_root_margin_bottom_px")]
    pub root_margin_bottom_px: f64,
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
    #[serde(default = "default_load_delay_ms")]
    pub load_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntroConfig {
    #[serde(default = "default_header_delay_ms")]
    pub header_delay_ms: u64,
    #[serde(default = "default_title_delay_ms")]
    pub title_delay_ms: u64,
}

/// Pomodoro page timers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "default_focus_min")]
    pub focus_min: u64,
    #[serde(default = "default_break_min")]
    pub break_min: u64,
    #[serde(default = "default_long_break_every")]
    pub long_break_every: u32,
    /// Pause between a finished pomodoro and its automatic break.
    #[serde(default = "default_auto_break_delay_ms")]
    pub auto_break_delay_ms: u64,
    #[serde(default = "default_micro_min")]
    pub micro_min: u64,
}

/// Quick-help page timers (`breath`, `worry`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickHelpConfig {
    #[serde(default = "default_quick_timer_min")]
    pub timer_min: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Name under which page views are counted.
    #[serde(default = "default_page_name")]
    pub name: String,
    #[serde(default = "default_true")]
    pub track_views: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pagewire/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub modal: ModalConfig,
    #[serde(default)]
    pub menu: MenuConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub intro: IntroConfig,
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
    #[serde(default)]
    pub quick_help: QuickHelpConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_settle_delay_ms() -> u64 {
    300
}
fn default_frame_ms() -> u64 {
    16
}
fn default_mobile_breakpoint_px() -> f64 {
    768.0
}
fn default_threshold() -> f64 {
    0.1
}
fn default_root_margin_bottom_px() -> f64 {
    -50.0
}
fn default_stagger_ms() -> u64 {
    100
}
fn default_load_delay_ms() -> u64 {
    300
}
fn default_header_delay_ms() -> u64 {
    500
}
fn default_title_delay_ms() -> u64 {
    1000
}
fn default_focus_min() -> u64 {
    25
}
fn default_break_min() -> u64 {
    5
}
fn default_long_break_every() -> u32 {
    4
}
fn default_auto_break_delay_ms() -> u64 {
    2000
}
fn default_micro_min() -> u64 {
    60
}
fn default_quick_timer_min() -> u64 {
    5
}
fn default_page_name() -> String {
    "index".into()
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            frame_ms: default_frame_ms(),
            close_on_overlay_click: true,
            close_on_esc: true,
            auto_register: true,
        }
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint_px: default_mobile_breakpoint_px(),
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            root_margin_bottom_px: default_root_margin_bottom_px(),
            stagger_ms: default_stagger_ms(),
            load_delay_ms: default_load_delay_ms(),
        }
    }
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            header_delay_ms: default_header_delay_ms(),
            title_delay_ms: default_title_delay_ms(),
        }
    }
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            focus_min: default_focus_min(),
            break_min: default_break_min(),
            long_break_every: default_long_break_every(),
            auto_break_delay_ms: default_auto_break_delay_ms(),
            micro_min: default_micro_min(),
        }
    }
}

impl Default for QuickHelpConfig {
    fn default() -> Self {
        Self {
            timer_min: default_quick_timer_min(),
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            name: default_page_name(),
            track_views: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let unknown = || ConfigError::UnknownKey(key.to_string());

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// `~/.config/pagewire/config.toml`
    pub fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit
    /// the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(indoc::indoc! {r#"
            [modal]
            settle_delay_ms = 450

            [pomodoro]
            focus_min = 50
        "#})
        .unwrap();
        assert_eq!(parsed.modal.settle_delay_ms, 450);
        assert_eq!(parsed.modal.frame_ms, 16);
        assert!(parsed.modal.close_on_esc);
        assert_eq!(parsed.pomodoro.focus_min, 50);
        assert_eq!(parsed.pomodoro.break_min, 5);
        assert_eq!(parsed.reveal.root_margin_bottom_px, -50.0);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("modal.settle_delay_ms").as_deref(), Some("300"));
        assert_eq!(cfg.get("modal.close_on_esc").as_deref(), Some("true"));
        assert_eq!(cfg.get("page.name").as_deref(), Some("index"));
        assert!(cfg.get("modal.missing_key").is_none());
        assert!(cfg.get("modal").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("modal.close_on_overlay_click", "false").unwrap();
        cfg.set("pomodoro.long_break_every", "3").unwrap();
        cfg.set("reveal.threshold", "0.25").unwrap();
        cfg.set("menu.mobile_breakpoint_px", "1024").unwrap();
        cfg.set("page.name", "daily").unwrap();
        assert!(!cfg.modal.close_on_overlay_click);
        assert_eq!(cfg.pomodoro.long_break_every, 3);
        assert_eq!(cfg.reveal.threshold, 0.25);
        assert_eq!(cfg.menu.mobile_breakpoint_px, 1024.0);
        assert_eq!(cfg.page.name, "daily");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("modal.nonexistent_key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("", "value"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(cfg.set("modal", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("modal.close_on_esc", "not_a_bool"),
            Err(ConfigError::InvalidValue { .. })
        ));
        // Negative value for an unsigned field fails on the way back.
        assert!(cfg.set("modal.settle_delay_ms", "-5").is_err());
        assert_eq!(cfg.modal.settle_delay_ms, 300);
    }

    #[test]
    fn load_from_creates_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("intro.header_delay_ms", "750").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().intro.header_delay_ms, 750);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "modal = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(CoreError::Config(ConfigError::LoadFailed { .. }))
        ));
    }
}
