//! Host page errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    /// The element reference no longer resolves (page re-rendered or reloaded).
    #[error("Stale element: {0}")]
    StaleElement(String),

    /// A page-side script failed.
    #[error("Script error: {0}")]
    Script(String),

    /// The driver lost its connection to the page.
    #[error("Page detached: {0}")]
    Detached(String),

    /// The trigger events were already taken by another consumer.
    #[error("Trigger events already taken")]
    TriggerEventsTaken,
}
