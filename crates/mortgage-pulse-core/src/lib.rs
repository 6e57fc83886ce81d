pub mod amortization;
pub mod error;
pub mod types;

#[cfg(feature = "refinance")]
pub mod refinance;

#[cfg(feature = "market")]
pub mod market;

pub use error::RefiError;
pub use types::*;

/// Standard result type for all engine operations
pub type RefiResult<T> = Result<T, RefiError>;
