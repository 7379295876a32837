//! Error types for the memlayer protocol layer.

mod bridge;
mod cycle;
mod page;

pub use bridge::*;
pub use cycle::*;
pub use page::*;
