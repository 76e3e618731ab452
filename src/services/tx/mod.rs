pub mod builder;
pub mod calldata;
pub mod gas;
pub mod signer;
pub mod types;

pub use builder::TransactionBuilder;
pub use gas::{GasBufferPolicy, GasEstimateContext, GasEstimateParams, GasEstimator};
pub use signer::{DryRunSubmitter, SubmissionHandle, TxSubmitter};
pub use types::{Asset, DraftGas, DraftTransaction, FeeFields, NftStandard, TransactionParams};
