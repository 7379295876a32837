//! Chrome DevTools Protocol page driver for memlayer.
//!
//! Attaches to an already open provider tab in a Chrome started with
//! `--remote-debugging-port` and implements [`PageDriver`] and
//! [`Notifier`] on top of a small helper script installed in the page.
//!
//! [`PageDriver`]: memlayer_protocols::PageDriver
//! [`Notifier`]: memlayer_protocols::Notifier

mod cdp;
mod page;
mod script;

pub use cdp::{CdpClient, CdpError, PageInfo, PageSession};
pub use page::CdpPage;
