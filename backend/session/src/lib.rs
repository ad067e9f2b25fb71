//! Session lifecycle plumbing for the relaybot backend.

pub mod reconnect;

pub use reconnect::{ReconnectController, SessionEvent, SessionEvents};
