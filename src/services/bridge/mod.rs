pub mod controller;
pub mod feature_gate;
pub mod quote_aggregator;
pub mod quote_request_model;
pub mod quote_selector;
pub mod traits;

pub use controller::BridgeController;
pub use feature_gate::BridgeFeatureGate;
pub use quote_aggregator::{AggregatorSettings, QuoteAggregator, QuoteSnapshot, SubmitOutcome};
pub use quote_request_model::QuoteRequestModel;
pub use quote_selector::QuoteSelector;
pub use traits::{FeatureFlagSource, QuoteProvider, TokenListProvider};
