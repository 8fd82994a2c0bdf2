//! Configuration loading and management

use super::schema::Config;
use super::validate::validate_config;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Prefix of environment variables that override config paths,
/// e.g. `SECRETARY__GATEWAY__PORT=8080`.
const ENV_PREFIX: &str = "SECRETARY__";

/// Configuration loader
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader with the default config directory
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .map(|h| h.join(".ai-secretary"))
            .unwrap_or_else(|| PathBuf::from(".ai-secretary"));

        Self { config_dir }
    }

    /// Create a new config loader with a custom config directory
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Load configuration from file and environment
    pub fn load(&self) -> crate::Result<Config> {
        let config_path = self.config_path();
        let mut merged = serde_json::to_value(Config::default())?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let file_value: Value = serde_json::from_str(&content)?;
            merge_values(&mut merged, file_value);
        }

        apply_alias_overrides(&mut merged);
        apply_path_overrides(&mut merged);

        let config: Config = serde_json::from_value(merged)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &Config) -> crate::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(self.config_path(), content)?;
        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep-merge `overlay` into `base`: objects merge key by key, anything else
/// replaces
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Walk `path` from `current`, creating objects on the way, and return the
/// leaf slot (`Null` if it did not exist)
fn slot_mut<'a>(current: &'a mut Value, path: &[&str]) -> &'a mut Value {
    let Some((segment, rest)) = path.split_first() else {
        return current;
    };
    match current {
        Value::Object(map) => slot_mut(
            map.entry(segment.to_string()).or_insert(Value::Null),
            rest,
        ),
        other => {
            *other = Value::Object(Map::new());
            slot_mut(other, path)
        }
    }
}

/// Interpret a raw environment value for the slot it replaces. String
/// settings stay strings; anything else is read as JSON when it parses.
fn env_value(existing: &Value, raw: &str) -> Value {
    if existing.is_string() {
        return Value::String(raw.to_string());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn apply_alias_overrides(config: &mut Value) {
    let aliases: [(&str, &[&str]); 2] = [
        ("OPENAI_API_KEY", &["providers", "openai", "api_key"]),
        ("OPENAI_API_BASE", &["providers", "openai", "api_base"]),
    ];

    for (env_key, path) in aliases {
        if let Ok(value) = std::env::var(env_key) {
            *slot_mut(config, path) = Value::String(value);
        }
    }
}

fn apply_path_overrides(config: &mut Value) {
    for (key, raw) in std::env::vars() {
        let Some(suffix) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let segments: Vec<String> = suffix
            .split("__")
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_lowercase())
            .collect();
        if segments.is_empty() {
            continue;
        }
        let path: Vec<&str> = segments.iter().map(String::as_str).collect();
        let slot = slot_mut(config, &path);
        *slot = env_value(slot, &raw);
    }
}
