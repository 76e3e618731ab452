mod dry_run;
mod signer_trait;

pub use dry_run::DryRunSubmitter;
pub use signer_trait::{SubmissionHandle, TxSubmitter};
