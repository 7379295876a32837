//! Background bridge errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The coordinator answered with `success: false`.
    #[error("Save rejected: {0}")]
    SaveRejected(String),

    /// The coordinator could not be reached or did not answer.
    #[error("Communication error: {0}")]
    Communication(String),
}
