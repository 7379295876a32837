//! # memlayer Config
//!
//! Configuration management for memlayer: backend endpoints, auth,
//! polling/timing knobs and per-provider selector profiles.

mod error;
mod loader;
mod providers;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use providers::builtin_profiles;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
