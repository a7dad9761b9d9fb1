pub mod currency;
pub mod error;
pub mod retry;
pub mod roles;

pub use currency::Currency;
pub use error::{AppError, Result};
pub use retry::{retry_fixed, RetryOutcome, RetryPolicy};
pub use roles::Role;
