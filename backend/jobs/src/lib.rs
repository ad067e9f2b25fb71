//! Job correlation for the relaybot backend.
//!
//! Outstanding network operations are tracked by the id the remote service
//! assigned; completions remove entries and a session re-establishment
//! re-issues everything still pending.

pub mod registry;

pub use registry::{IssueFn, JobDescriptor, JobRegistry};
