use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use quizlite_core::config::LoadOptions;
use serde_json::{json, Map, Value};

use super::{load_config, CommandResult};

const COMMAND: &str = "config";

// Key path in the TOML file, then the environment variables that can set it.
const FIELDS: &[(&str, &[&str])] = &[
    ("server.bind_address", &["QUIZLITE_SERVER_BIND_ADDRESS"]),
    ("server.port", &["QUIZLITE_SERVER_PORT", "PORT"]),
    ("server.public_url", &["QUIZLITE_SERVER_PUBLIC_URL", "PUBLIC_URL"]),
    ("server.static_dir", &["QUIZLITE_SERVER_STATIC_DIR"]),
    ("server.graceful_shutdown_secs", &["QUIZLITE_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
    ("quiz.document_path", &["QUIZLITE_QUIZ_DOCUMENT_PATH"]),
    ("catalog.shop", &["QUIZLITE_CATALOG_SHOP", "SHOPIFY_SHOP"]),
    ("catalog.storefront_token", &["QUIZLITE_CATALOG_STOREFRONT_TOKEN", "STOREFRONT_API_TOKEN"]),
    ("catalog.api_version", &["QUIZLITE_CATALOG_API_VERSION"]),
    ("catalog.source", &["QUIZLITE_CATALOG_SOURCE"]),
    ("catalog.timeout_secs", &["QUIZLITE_CATALOG_TIMEOUT_SECS"]),
    ("admin.password", &["QUIZLITE_ADMIN_PASSWORD", "ADMIN_PASSWORD"]),
    ("logging.level", &["QUIZLITE_LOGGING_LEVEL", "QUIZLITE_LOG_LEVEL"]),
    ("logging.format", &["QUIZLITE_LOGGING_FORMAT", "QUIZLITE_LOG_FORMAT"]),
];

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let sources: Map<String, Value> = FIELDS
        .iter()
        .map(|(key_path, env_keys)| {
            let source =
                field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
            (key_path.to_string(), Value::String(source))
        })
        .collect();

    CommandResult::success_with(
        COMMAND,
        "effective config (source precedence: env > file > default)",
        Some(json!({
            "config_file": config_file_path.map(|path| path.display().to_string()),
            "config": config.redacted(),
            "sources": sources,
        })),
    )
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("quizlite.toml"), PathBuf::from("config/quizlite.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<toml::Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<toml::Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&toml::Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
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

fn contains_path(root: &toml::Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
