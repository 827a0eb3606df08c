use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use tiendita_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", "TIENDITA_DATABASE_URL"),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", "TIENDITA_DATABASE_MAX_CONNECTIONS"),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", "TIENDITA_DATABASE_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "whatsapp.phone_number_id",
        &config.whatsapp.phone_number_id,
        source("whatsapp.phone_number_id", "TIENDITA_WHATSAPP_PHONE_NUMBER_ID"),
    ));
    lines.push(render_line(
        "whatsapp.access_token",
        &redact_secret(config.whatsapp.access_token.expose_secret()),
        source("whatsapp.access_token", "TIENDITA_WHATSAPP_ACCESS_TOKEN"),
    ));
    lines.push(render_line(
        "whatsapp.verify_token",
        &redact_secret(config.whatsapp.verify_token.expose_secret()),
        source("whatsapp.verify_token", "TIENDITA_WHATSAPP_VERIFY_TOKEN"),
    ));
    lines.push(render_line(
        "whatsapp.api_base",
        &config.whatsapp.api_base,
        source("whatsapp.api_base", "TIENDITA_WHATSAPP_API_BASE"),
    ));

    lines.push(render_line(
        "llm.api_key",
        &redact_secret(config.llm.api_key.expose_secret()),
        source("llm.api_key", "TIENDITA_LLM_API_KEY"),
    ));
    lines.push(render_line(
        "llm.base_url",
        &config.llm.base_url,
        source("llm.base_url", "TIENDITA_LLM_BASE_URL"),
    ));
    lines.push(render_line("llm.model", &config.llm.model, source("llm.model", "TIENDITA_LLM_MODEL")));
    lines.push(render_line(
        "llm.mode",
        &format!("{:?}", config.llm.mode),
        source("llm.mode", "TIENDITA_LLM_MODE"),
    ));
    lines.push(render_line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        source("llm.timeout_secs", "TIENDITA_LLM_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "TIENDITA_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "TIENDITA_SERVER_PORT"),
    ));
    lines.push(render_line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
        source("server.health_check_port", "TIENDITA_SERVER_HEALTH_CHECK_PORT"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "TIENDITA_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "TIENDITA_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("tiendita.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/tiendita.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_secret};

    #[test]
    fn nested_toml_paths_are_resolved() {
        let doc: toml::Value = "[llm]\nmode = \"tool_calling\"".parse().expect("toml");
        assert!(contains_path(&doc, "llm.mode"));
        assert!(!contains_path(&doc, "llm.api_key"));
        assert!(!contains_path(&doc, "server.port"));
    }

    #[test]
    fn secrets_never_render_verbatim() {
        assert_eq!(redact_secret("EAAG-live-token"), "<redacted>");
        assert_eq!(redact_secret("  "), "<empty>");
    }
}
