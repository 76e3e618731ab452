pub mod bridge_state;
pub mod feature_flags;
pub mod network;
pub mod quote;
pub mod quote_request;
pub mod token;

pub use bridge_state::BridgeState;
pub use feature_flags::BridgeFeatureFlags;
pub use network::Network;
pub use quote::{Quote, QuoteAsset, QuoteSetState, QuoteTrade, RequestStatus};
pub use quote_request::{NATIVE_TOKEN_ADDRESS, QuoteRequest, QuoteRequestUpdate};
pub use token::BridgeToken;
