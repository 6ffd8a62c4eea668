//! File-backed quiz document.
//!
//! Every `load` re-reads the file so external edits apply without a restart.
//! `save` rewrites the whole document; concurrent writers are not
//! coordinated and the last write wins.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::domain::quiz::QuizConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("quiz document not found at `{0}`")]
    Missing(PathBuf),
    #[error("could not read quiz document `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("quiz document `{path}` is malformed: {source}")]
    Malformed { path: PathBuf, source: serde_json::Error },
    #[error("could not serialize quiz document: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("could not write quiz document `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}

/// Rejection of an admin write. The stored document is left untouched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("quiz document must be a JSON object")]
    NotAnObject,
    #[error("quiz document requires an array field `{0}`")]
    MissingArray(&'static str),
    #[error("quiz document does not match the expected shape: {0}")]
    Shape(String),
}

#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocking read for startup checks and the CLI.
    pub fn load(&self) -> Result<QuizConfig, StoreError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| self.read_error(source))?;
        self.parse(&raw)
    }

    /// Non-blocking read for request handlers.
    pub async fn load_async(&self) -> Result<QuizConfig, StoreError> {
        let raw =
            tokio::fs::read_to_string(&self.path).await.map_err(|source| self.read_error(source))?;
        self.parse(&raw)
    }

    pub fn save(&self, config: &QuizConfig) -> Result<(), StoreError> {
        let raw = encode(config)?;
        fs::write(&self.path, raw)
            .map_err(|source| StoreError::Write { path: self.path.clone(), source })?;
        self.log_saved(config);
        Ok(())
    }

    pub async fn save_async(&self, config: &QuizConfig) -> Result<(), StoreError> {
        let raw = encode(config)?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|source| StoreError::Write { path: self.path.clone(), source })?;
        self.log_saved(config);
        Ok(())
    }

    fn read_error(&self, source: std::io::Error) -> StoreError {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::Missing(self.path.clone())
        } else {
            StoreError::Read { path: self.path.clone(), source }
        }
    }

    fn parse(&self, raw: &str) -> Result<QuizConfig, StoreError> {
        serde_json::from_str(raw)
            .map_err(|source| StoreError::Malformed { path: self.path.clone(), source })
    }

    fn log_saved(&self, config: &QuizConfig) {
        info!(
            event_name = "quiz.store.saved",
            path = %self.path.display(),
            questions = config.questions.len(),
            rules = config.rules.len(),
            combos = config.combos.len(),
            "quiz document overwritten"
        );
    }
}

fn encode(config: &QuizConfig) -> Result<String, StoreError> {
    let mut raw = serde_json::to_string_pretty(config).map_err(StoreError::Serialize)?;
    raw.push('\n');
    Ok(raw)
}

/// Checks an admin-submitted document before anything is written.
pub fn validate_document(document: Value) -> Result<QuizConfig, ValidationError> {
    let object = document.as_object().ok_or(ValidationError::NotAnObject)?;
    for field in ["questions", "rules"] {
        if !object.get(field).is_some_and(Value::is_array) {
            return Err(ValidationError::MissingArray(field));
        }
    }

    serde_json::from_value(document).map_err(|error| ValidationError::Shape(error.to_string()))
}
