pub mod error;

pub use error::{AppError, GasEstimateError, QuoteError, QuoteErrorCode};
