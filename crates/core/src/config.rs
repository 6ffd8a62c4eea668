use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

const REDACTED: &str = "[redacted]";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub quiz: QuizDocumentConfig,
    pub catalog: CatalogConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub public_url: Option<String>,
    pub static_dir: PathBuf,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct QuizDocumentConfig {
    pub document_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub shop: Option<String>,
    pub storefront_token: Option<SecretString>,
    pub api_version: String,
    pub source: CatalogSource,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub password: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Where product details come from when materializing results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    Storefront,
    ProductJs,
    Disabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub document_path: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub catalog_source: Option<CatalogSource>,
    pub shop: Option<String>,
    pub storefront_token: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3000,
                public_url: None,
                static_dir: PathBuf::from("public"),
                graceful_shutdown_secs: 15,
            },
            quiz: QuizDocumentConfig { document_path: PathBuf::from("data/quiz.json") },
            catalog: CatalogConfig {
                shop: None,
                storefront_token: None,
                api_version: "2024-07".to_string(),
                source: CatalogSource::Storefront,
                timeout_secs: 5,
            },
            admin: AdminConfig { password: None },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for CatalogSource {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "storefront" => Ok(Self::Storefront),
            "product_js" => Ok(Self::ProductJs),
            "disabled" | "none" => Ok(Self::Disabled),
            other => Err(ConfigError::Validation(format!(
                "unsupported catalog source `{other}` (expected storefront|product_js|disabled)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ServerConfig {
    /// Public base URL used in startup logs; falls back to the local listener.
    pub fn public_url(&self) -> String {
        self.public_url.clone().unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }
}

impl CatalogConfig {
    /// Catalog the server should build, if any. Storefront lookups need both
    /// a shop and a token; without them results degrade to handles.
    pub fn effective_source(&self) -> Option<CatalogSource> {
        let has_shop = self.shop.as_deref().is_some_and(|shop| !shop.trim().is_empty());
        let has_token = self
            .storefront_token
            .as_ref()
            .is_some_and(|token| !token.expose_secret().trim().is_empty());
        match self.source {
            CatalogSource::Storefront if has_shop && has_token => Some(CatalogSource::Storefront),
            CatalogSource::ProductJs if has_shop => Some(CatalogSource::ProductJs),
            _ => None,
        }
    }
}

impl AdminConfig {
    pub fn is_enabled(&self) -> bool {
        self.password.as_ref().is_some_and(|password| !password.expose_secret().is_empty())
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("quizlite.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Effective configuration with secrets replaced by a marker.
    pub fn redacted(&self) -> Value {
        let secret = |value: &Option<SecretString>| value.as_ref().map(|_| REDACTED);
        json!({
            "server": {
                "bind_address": self.server.bind_address,
                "port": self.server.port,
                "public_url": self.server.public_url(),
                "static_dir": self.server.static_dir,
                "graceful_shutdown_secs": self.server.graceful_shutdown_secs,
            },
            "quiz": { "document_path": self.quiz.document_path },
            "catalog": {
                "shop": self.catalog.shop,
                "storefront_token": secret(&self.catalog.storefront_token),
                "api_version": self.catalog.api_version,
                "source": self.catalog.source,
                "effective_source": self.catalog.effective_source(),
                "timeout_secs": self.catalog.timeout_secs,
            },
            "admin": { "password": secret(&self.admin.password) },
            "logging": { "level": self.logging.level, "format": self.logging.format },
        })
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(public_url) = server.public_url {
                self.server.public_url = Some(public_url);
            }
            if let Some(static_dir) = server.static_dir {
                self.server.static_dir = static_dir;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(quiz) = patch.quiz {
            if let Some(document_path) = quiz.document_path {
                self.quiz.document_path = document_path;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(shop) = catalog.shop {
                self.catalog.shop = Some(shop);
            }
            if let Some(storefront_token_value) = catalog.storefront_token {
                self.catalog.storefront_token = Some(secret_value(storefront_token_value));
            }
            if let Some(api_version) = catalog.api_version {
                self.catalog.api_version = api_version;
            }
            if let Some(source) = catalog.source {
                self.catalog.source = source;
            }
            if let Some(timeout_secs) = catalog.timeout_secs {
                self.catalog.timeout_secs = timeout_secs;
            }
        }

        if let Some(admin) = patch.admin {
            if let Some(password_value) = admin.password {
                self.admin.password = Some(secret_value(password_value));
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QUIZLITE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some((key, value)) = read_env_aliased(&["QUIZLITE_SERVER_PORT", "PORT"]) {
            self.server.port = parse_u16(key, &value)?;
        }
        if let Some((_, value)) = read_env_aliased(&["QUIZLITE_SERVER_PUBLIC_URL", "PUBLIC_URL"]) {
            self.server.public_url = Some(value);
        }
        if let Some(value) = read_env("QUIZLITE_SERVER_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("QUIZLITE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("QUIZLITE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("QUIZLITE_QUIZ_DOCUMENT_PATH") {
            self.quiz.document_path = PathBuf::from(value);
        }

        if let Some((_, value)) = read_env_aliased(&["QUIZLITE_CATALOG_SHOP", "SHOPIFY_SHOP"]) {
            self.catalog.shop = Some(value);
        }
        if let Some((_, value)) =
            read_env_aliased(&["QUIZLITE_CATALOG_STOREFRONT_TOKEN", "STOREFRONT_API_TOKEN"])
        {
            self.catalog.storefront_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("QUIZLITE_CATALOG_API_VERSION") {
            self.catalog.api_version = value;
        }
        if let Some(value) = read_env("QUIZLITE_CATALOG_SOURCE") {
            self.catalog.source = value.parse()?;
        }
        if let Some(value) = read_env("QUIZLITE_CATALOG_TIMEOUT_SECS") {
            self.catalog.timeout_secs = parse_u64("QUIZLITE_CATALOG_TIMEOUT_SECS", &value)?;
        }

        if let Some((_, value)) = read_env_aliased(&["QUIZLITE_ADMIN_PASSWORD", "ADMIN_PASSWORD"])
        {
            self.admin.password = Some(secret_value(value));
        }

        let log_level =
            read_env("QUIZLITE_LOGGING_LEVEL").or_else(|| read_env("QUIZLITE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUIZLITE_LOGGING_FORMAT").or_else(|| read_env("QUIZLITE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(document_path) = overrides.document_path {
            self.quiz.document_path = document_path;
        }
        if let Some(static_dir) = overrides.static_dir {
            self.server.static_dir = static_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(source) = overrides.catalog_source {
            self.catalog.source = source;
        }
        if let Some(shop) = overrides.shop {
            self.catalog.shop = Some(shop);
        }
        if let Some(storefront_token) = overrides.storefront_token {
            self.catalog.storefront_token = Some(secret_value(storefront_token));
        }
        if let Some(admin_password) = overrides.admin_password {
            self.admin.password = Some(secret_value(admin_password));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_quiz(&self.quiz)?;
        validate_catalog(&self.catalog)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("quizlite.toml"), PathBuf::from("config/quizlite.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    if let Some(public_url) = &server.public_url {
        if !public_url.starts_with("http://") && !public_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "server.public_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_quiz(quiz: &QuizDocumentConfig) -> Result<(), ConfigError> {
    if quiz.document_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("quiz.document_path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.timeout_secs == 0 || catalog.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "catalog.timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    if catalog.api_version.trim().is_empty() {
        return Err(ConfigError::Validation("catalog.api_version must not be empty".to_string()));
    }

    if let Some(shop) = &catalog.shop {
        if shop.contains("://") || shop.contains('/') {
            return Err(ConfigError::Validation(format!(
                "catalog.shop must be a bare domain such as `example.myshopify.com`, got `{shop}`"
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// First non-empty variable among `keys`, in priority order.
fn read_env_aliased<'k>(keys: &[&'k str]) -> Option<(&'k str, String)> {
    keys.iter().find_map(|key| read_env(key).map(|value| (*key, value)))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    quiz: Option<QuizPatch>,
    catalog: Option<CatalogPatch>,
    admin: Option<AdminPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    public_url: Option<String>,
    static_dir: Option<PathBuf>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct QuizPatch {
    document_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    shop: Option<String>,
    storefront_token: Option<String>,
    api_version: Option<String>,
    source: Option<CatalogSource>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AdminPatch {
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
