pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "policy_fund")]
pub mod policy_fund;

#[cfg(feature = "diagnosis")]
pub mod diagnosis;

#[cfg(feature = "tax")]
pub mod tax;

pub use error::McenterError;
pub use types::*;

/// Standard result type for all calculator operations
pub type McenterResult<T> = Result<T, McenterError>;
