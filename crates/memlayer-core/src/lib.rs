//! # memlayer Core
//!
//! Page-side orchestration for memlayer.
//!
//! ## Components
//!
//! - [`ChannelBridge`] - Background bridge client over a tokio channel
//! - [`SelectorAdapter`] - Provider adapter driven by selector profiles
//! - [`UiInjector`] - Waits for the provider UI and installs the trigger
//! - [`AugmentationPipeline`] - One user-initiated augmentation cycle
//! - [`ResponseCapture`] - Detects when a streamed reply has finished
//! - [`ProviderSession`] - Ties the above together for one provider page
//!
//! ## Flow
//!
//! ```text
//! trigger click ─► pipeline ─┬─► save_prompt ─┐
//!                            └─► get_context ─┴─► compose ─► inject ─► submit ─► arm
//!                                                                                │
//!                      mutation stream ─► capture evaluation ─► save_response ◄──┘
//! ```

mod adapter;
mod bridge;
mod capture;
mod compose;
mod injector;
mod pipeline;
mod session;

pub use adapter::SelectorAdapter;
pub use bridge::ChannelBridge;
pub use capture::{CaptureOutcome, CaptureState, CaptureTicket, ResponseCapture};
pub use compose::{compose_augmented, CONTEXT_HEADER, QUESTION_LABEL};
pub use injector::{InjectorState, RetryPolicy, UiInjector};
pub use pipeline::{AugmentationPipeline, CycleReport, CycleState};
pub use session::{initialize_identity, ProviderSession, SessionOptions};
