//! Augmentation cycle errors.

use thiserror::Error;

use super::{BridgeError, PageError};

/// Why an augmentation cycle stopped short of arming a capture.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Input is empty")]
    EmptyInput,

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// A required surface or control could not be located.
    #[error("Missing UI element: {0}")]
    MissingUiElement(String),

    #[error(transparent)]
    Page(#[from] PageError),
}

impl CycleError {
    /// Text shown to the user when this error ends a cycle.
    pub fn user_message(&self) -> String {
        match self {
            CycleError::NotAuthenticated => "Please sign in first".to_string(),
            CycleError::EmptyInput => "Please type a message first".to_string(),
            CycleError::MissingUiElement(what) => format!("Could not find {}", what),
            CycleError::Bridge(e) => format!("Error: {}", e),
            CycleError::Page(e) => format!("Error: {}", e),
        }
    }
}
