pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "deposit")]
pub mod deposit;

#[cfg(feature = "tax")]
pub mod tax;

#[cfg(feature = "debt")]
pub mod debt;

#[cfg(feature = "market")]
pub mod market;

pub use error::FinanceError;
pub use types::*;

/// Standard result type for all personal-finance operations
pub type FinanceResult<T> = Result<T, FinanceError>;
