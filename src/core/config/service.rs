use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::Settings;
use super::validation::{require_credentials, validate_config};
use crate::core::errors::ConfigError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 5] = ["api_key", "secret", "password", "_token", "credential"];

const SENSITIVE_WHITELIST: [&str; 1] = ["max_tokens"];

/// Environment variable → dotted settings path.
const ENV_OVERRIDES: [(&str, &str, &str); 10] = [
    ("OPENAI_API_BASE", "openai", "api_base"),
    ("OPENAI_API_KEY", "openai", "api_key"),
    ("OPENAI_API_VERSION", "openai", "api_version"),
    ("AZURE_EMBEDDING_DEPLOYMENT", "openai", "embedding_deployment"),
    ("AZURE_CHAT_DEPLOYMENT", "openai", "chat_deployment"),
    ("SEARCH_SERVICE_NAME", "search", "service"),
    ("SEARCH_API_KEY", "search", "api_key"),
    ("SEARCH_INDEX_NAME", "search", "index_name"),
    ("HOST", "server", "host"),
    ("PORT", "server", "port"),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    /// Loads `.env`, then builds settings from the config file and the
    /// process environment. Called once per process.
    pub fn load_settings(&self) -> Result<Settings, ConfigError> {
        let _ = dotenvy::dotenv();
        let vars: HashMap<String, String> = env::vars().collect();
        self.load_settings_from(&vars)
    }

    /// Merges the optional YAML file with environment overrides, validates the
    /// result and decodes it.
    pub fn load_settings_from(&self, vars: &HashMap<String, String>) -> Result<Settings, ConfigError> {
        let file_config = load_yaml_file(&self.paths.config_path)?;
        let env_config = env_overlay(vars)?;
        let merged = deep_merge(&file_config, &env_config);

        validate_config(&merged)?;
        let settings: Settings = serde_json::from_value(merged)?;
        require_credentials(&settings)?;
        Ok(settings)
    }

    pub fn redacted(&self, settings: &Settings) -> Value {
        serde_json::to_value(settings)
            .map(|value| redact_sensitive_values(&value))
            .unwrap_or(Value::Null)
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, ConfigError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let value = serde_yaml::from_str::<Value>(&contents).map_err(|source| ConfigError::Yaml {
        path: path.display().to_string(),
        source,
    })?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(ConfigError::invalid("root", "expected object")),
    }
}

fn env_overlay(vars: &HashMap<String, String>) -> Result<Value, ConfigError> {
    let mut root = Map::new();
    for (var, section, key) in ENV_OVERRIDES {
        let Some(raw) = vars.get(var) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let value = if var == "PORT" {
            let port = raw
                .parse::<u16>()
                .map_err(|_| ConfigError::invalid("PORT", "expected a port number"))?;
            Value::from(port)
        } else {
            Value::String(raw.to_string())
        };

        let entry = root
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(map) = entry.as_object_mut() {
            map.insert(key.to_string(), value);
        }
    }
    Ok(Value::Object(root))
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST.contains(&key_lower.as_str()) {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}
