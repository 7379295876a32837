//! Coordinator for memlayer.
//!
//! Serves the typed bridge requests sent by provider sessions: answers
//! auth status from the configured identity and proxies saves and context
//! lookups to the persistence backend over HTTP.

mod backend;
mod coordinator;
mod error;

pub use backend::BackendClient;
pub use coordinator::Coordinator;
pub use error::CoordinatorError;
