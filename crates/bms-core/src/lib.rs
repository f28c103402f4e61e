pub mod error;
pub mod types;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "session")]
pub mod session;

#[cfg(feature = "client")]
pub mod api;

#[cfg(feature = "client")]
pub mod client;

pub use error::{BmsError, ClientError, ValidationRejected};
pub use types::*;

/// Standard result type for all bms-core operations
pub type BmsResult<T> = Result<T, BmsError>;
