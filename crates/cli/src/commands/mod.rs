pub mod config;
pub mod doctor;
pub mod recommend;
pub mod walk;

use std::fs;
use std::path::Path;

use quizlite_core::config::{AppConfig, LoadOptions};
use quizlite_core::domain::quiz::QuizConfig;
use quizlite_core::store::{ConfigStore, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_DOCUMENT: u8 = 3;
pub const EXIT_INPUT: u8 = 4;
pub const EXIT_RUNTIME: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with(command, message, None)
    }

    pub fn success_with(command: &str, message: impl Into<String>, data: Option<Value>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str, options: LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })
}

pub(crate) fn load_document(
    command: &str,
    config: &AppConfig,
) -> Result<(ConfigStore, QuizConfig), CommandResult> {
    let store = ConfigStore::new(&config.quiz.document_path);
    match store.load() {
        Ok(quiz) => Ok((store, quiz)),
        Err(error) => Err(document_failure(command, &error)),
    }
}

pub(crate) fn document_failure(command: &str, error: &StoreError) -> CommandResult {
    CommandResult::failure(command, "quiz_document", error.to_string(), EXIT_DOCUMENT)
}

pub(crate) fn read_input<T: DeserializeOwned>(command: &str, path: &Path) -> Result<T, CommandResult> {
    let raw = fs::read_to_string(path).map_err(|error| {
        CommandResult::failure(
            command,
            "invalid_input",
            format!("could not read `{}`: {error}", path.display()),
            EXIT_INPUT,
        )
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        CommandResult::failure(
            command,
            "invalid_input",
            format!("could not parse `{}`: {error}", path.display()),
            EXIT_INPUT,
        )
    })
}

pub(crate) fn runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME,
        )
    })
}
