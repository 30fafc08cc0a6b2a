use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    RequiredFields,
    InvalidEmail,
}

impl ValidationCode {
    /// String-lookup key for the user-facing message.
    pub fn message_key(self) -> &'static str {
        match self {
            Self::RequiredFields => "error_required_fields",
            Self::InvalidEmail => "error_invalid_email",
        }
    }

    pub fn default_detail(self) -> &'static str {
        match self {
            Self::RequiredFields => "All fields are required",
            Self::InvalidEmail => "Please enter a valid email address",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code:?}: {detail}")]
pub struct ValidationError {
    pub code: ValidationCode,
    pub detail: String,
}

impl ValidationError {
    pub fn new(code: ValidationCode) -> Self {
        Self {
            code,
            detail: code.default_detail().to_string(),
        }
    }
}
