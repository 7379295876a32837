//! # memlayer Protocols
//!
//! Core protocol definitions (traits and data types) for memlayer.
//! Contains only interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`BackgroundBridge`] - Typed request/response channel to the coordinator
//! - [`ProviderAdapter`] - Capability set implemented once per chat surface
//! - [`PageDriver`] - Low-level access to the host page
//! - [`Notifier`] - Ephemeral user-visible status messages

pub mod adapter;
pub mod bridge;
pub mod error;
pub mod notify;
pub mod page;
pub mod types;

pub use adapter::ProviderAdapter;
pub use bridge::{
    AuthStatus, BackgroundBridge, BridgeCall, BridgeEnvelope, BridgeRequest, ContextPayload,
    UserInfo,
};
pub use error::{BridgeError, CycleError, PageError};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use page::{
    ElementHandle, MutationBatch, MutationSubscription, PageDriver, TextSource, TriggerEvent,
    TriggerSpec,
};
pub use types::*;
