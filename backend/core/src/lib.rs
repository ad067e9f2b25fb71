pub mod error;
pub mod types;

pub use error::RelayError;
pub use types::{CommandContext, JobId};
