use serde_json::{Map, Value};

use super::settings::Settings;
use crate::core::errors::ConfigError;

/// Checks the merged (file + environment) configuration tree before it is
/// decoded into [`Settings`].
pub fn validate_config(config: &Value) -> Result<(), ConfigError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(openai) = expect_optional_object(root, "openai")? {
        for key in [
            "api_base",
            "api_key",
            "api_version",
            "embedding_deployment",
            "chat_deployment",
        ] {
            validate_optional_string_field(openai, &format!("openai.{}", key), key)?;
        }
    }

    if let Some(search) = expect_optional_object(root, "search")? {
        for key in ["service", "api_key", "index_name", "api_version"] {
            validate_optional_string_field(search, &format!("search.{}", key), key)?;
        }
        validate_u64_field(search, "search.top_k", "top_k", 1, 1_000)?;
        validate_u64_field(
            search,
            "search.embedding_dimensions",
            "embedding_dimensions",
            1,
            16_384,
        )?;
    }

    if let Some(ingest) = expect_optional_object(root, "ingest")? {
        validate_u64_field(ingest, "ingest.max_documents", "max_documents", 1, 1_000_000)?;
        validate_u64_field(ingest, "ingest.chunk_size", "chunk_size", 1, 100_000)?;
        validate_f64_field(
            ingest,
            "ingest.request_delay_secs",
            "request_delay_secs",
            0.0,
            3_600.0,
        )?;
        validate_f64_field(
            ingest,
            "ingest.rate_limit_cooldown_secs",
            "rate_limit_cooldown_secs",
            0.0,
            3_600.0,
        )?;
        validate_f64_field(
            ingest,
            "ingest.error_cooldown_secs",
            "error_cooldown_secs",
            0.0,
            3_600.0,
        )?;
        validate_optional_string_field(ingest, "ingest.verification_query", "verification_query")?;
        validate_string_array_field(ingest, "ingest.csv_candidates", "csv_candidates")?;
    }

    if let Some(generation) = expect_optional_object(root, "generation")? {
        validate_u64_field(generation, "generation.max_tokens", "max_tokens", 1, 128_000)?;
        validate_f64_field(generation, "generation.temperature", "temperature", 0.0, 2.0)?;
        validate_optional_string_field(generation, "generation.system_prompt", "system_prompt")?;
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    Ok(())
}

/// Settings both binaries cannot run without.
pub fn require_credentials(settings: &Settings) -> Result<(), ConfigError> {
    let required = [
        ("OPENAI_API_BASE", &settings.openai.api_base),
        ("OPENAI_API_KEY", &settings.openai.api_key),
        ("SEARCH_SERVICE_NAME", &settings.search.service),
        ("SEARCH_API_KEY", &settings.search.api_key),
        ("SEARCH_INDEX_NAME", &settings.search.index_name),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Missing(name));
        }
    }
    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ConfigError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ConfigError::invalid(
            path,
            format!("must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if !(min..=max).contains(&number) {
        return Err(ConfigError::invalid(
            path,
            format!("must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ConfigError::invalid(
                &format!("{}[{}]", path, index),
                "value cannot be empty",
            ));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ConfigError {
    ConfigError::invalid(path, format!("expected {}", expected))
}
