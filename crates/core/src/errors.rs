use thiserror::Error;

use crate::store::{StoreError, ValidationError};
use crate::wizard::WizardError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("quiz document failure: {0}")]
    Document(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error("admin access is disabled because no admin password is configured")]
    AdminDisabled,
    #[error("admin secret is missing or does not match")]
    AdminDenied,
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<StoreError> for ApplicationError {
    fn from(value: StoreError) -> Self {
        Self::Document(value.to_string())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unauthorized: {message}")]
    Unauthorized { message: String, correlation_id: String },
    #[error("forbidden: {message}")]
    Forbidden { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Unauthorized { .. } => "Admin secret is missing or incorrect.",
            Self::Forbidden { .. } => "Admin access is not enabled on this server.",
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Unauthorized { correlation_id, .. }
            | Self::Forbidden { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }

    /// Internal detail for logs. Never sent to clients.
    pub fn detail(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::Forbidden { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Unauthorized { correlation_id: id, .. }
            | InterfaceError::Forbidden { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let message = value.to_string();
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Validation(_) | ApplicationError::Wizard(_) => {
                Self::BadRequest { message, correlation_id }
            }
            ApplicationError::AdminDenied => Self::Unauthorized { message, correlation_id },
            ApplicationError::AdminDisabled => Self::Forbidden { message, correlation_id },
            ApplicationError::Document(_) | ApplicationError::Configuration(_) => {
                Self::Internal { message, correlation_id }
            }
        }
    }
}
