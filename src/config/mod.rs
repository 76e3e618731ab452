pub mod config;
pub mod flags_config;

pub use self::config::{BridgeConfig, ChainBufferConfig, Config, EthereumConfig, FlagsSource, GasConfig, NetworkConfig};
