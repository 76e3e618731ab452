pub mod amount;
pub mod convert;
pub mod logger;
pub mod time;

pub use amount::*;
pub use convert::*;
