pub mod gas_buffer;
pub mod gas_estimator;

pub use gas_buffer::{GasBufferPolicy, add_gas_buffer};
pub use gas_estimator::{BASE_TOKEN_ESTIMATE, GasEstimateContext, GasEstimateParams, GasEstimator, SIMPLE_SEND_GAS};
