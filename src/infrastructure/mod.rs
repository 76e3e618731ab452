pub mod bridge_api;
pub mod provider;
