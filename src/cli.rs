//! 命令行入口
use crate::errors::error::AppError;
use crate::models::NATIVE_TOKEN_ADDRESS;
use crate::models::domain::quote_request::DEFAULT_SLIPPAGE;
use crate::services::tx::{Asset, DraftTransaction};
use crate::utils::{parse_hex_data, parse_quantity, to_base_units};
use clap::{Args, Parser, Subcommand};
use ethers_core::types::Address;

/// Swap/bridge quote aggregation and transaction construction.
#[derive(Debug, Parser)]
#[command(name = "swap-bridge-rs", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll bridge quotes for a route until interrupted.
    Quote(QuoteArgs),
    /// Build (and dry-run submit) a send transaction.
    Send(SendArgs),
    /// Read a native or ERC-20 balance.
    Balance(BalanceArgs),
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    #[arg(long, env = "WALLET_ADDRESS", value_name = "ADDRESS")]
    pub wallet: Address,
    #[arg(long, value_name = "CHAIN_ID")]
    pub src_chain: u64,
    #[arg(long, value_name = "CHAIN_ID")]
    pub dest_chain: u64,
    /// Source token; the native asset when omitted.
    #[arg(long, value_name = "ADDRESS")]
    pub src_token: Option<Address>,
    /// Destination token; the native asset when omitted.
    #[arg(long, value_name = "ADDRESS")]
    pub dest_token: Option<Address>,
    /// Amount in human units, e.g. `1.5`.
    #[arg(long)]
    pub amount: String,
    /// Decimals of the source token.
    #[arg(long, default_value_t = 18)]
    pub decimals: u8,
    #[arg(long, default_value_t = DEFAULT_SLIPPAGE)]
    pub slippage: f64,
    /// Exit after the first fetched (or failed) quote set.
    #[arg(long)]
    pub once: bool,
    /// Print the recommended quote's trade as transaction params.
    #[arg(long)]
    pub preview_tx: bool,
}

impl QuoteArgs {
    pub fn src_token(&self) -> Address {
        self.src_token.unwrap_or(NATIVE_TOKEN_ADDRESS)
    }

    pub fn dest_token(&self) -> Address {
        self.dest_token.unwrap_or(NATIVE_TOKEN_ADDRESS)
    }

    /// 最小单位的十进制字符串
    pub fn base_amount(&self) -> Result<String, AppError> {
        Ok(to_base_units(&self.amount, self.decimals)?.to_string())
    }
}

#[derive(Debug, Args)]
pub struct SendArgs {
    #[arg(long, env = "SENDER_ADDRESS", value_name = "ADDRESS")]
    pub from: Address,
    #[arg(long, value_name = "ADDRESS")]
    pub to: Option<Address>,
    /// Human units for native/ERC-20, a quantity (decimal or 0x) for ERC-1155.
    #[arg(long, default_value = "0")]
    pub amount: String,
    /// ERC-20 contract address.
    #[arg(long, value_name = "ADDRESS", conflicts_with = "nft")]
    pub token: Option<Address>,
    #[arg(long, default_value_t = 18)]
    pub decimals: u8,
    /// NFT contract address.
    #[arg(long, value_name = "ADDRESS", requires = "token_id")]
    pub nft: Option<Address>,
    #[arg(long, default_value = "ERC721")]
    pub standard: String,
    #[arg(long)]
    pub token_id: Option<String>,
    /// Hex payload for native sends.
    #[arg(long)]
    pub data: Option<String>,
    #[arg(long)]
    pub gas_limit: Option<String>,
    #[arg(long)]
    pub gas_price: Option<String>,
    #[arg(long)]
    pub max_fee: Option<String>,
    #[arg(long)]
    pub priority_fee: Option<String>,
    /// Build a legacy (type 0x0) transaction.
    #[arg(long)]
    pub legacy: bool,
}

impl SendArgs {
    pub fn to_draft(&self) -> Result<DraftTransaction, AppError> {
        let asset = match (self.nft, self.token) {
            (Some(address), _) => Asset::Nft {
                address,
                standard: self.standard.parse()?,
                token_id: parse_quantity(self.token_id.as_deref().unwrap_or("0"))?,
            },
            (None, Some(address)) => Asset::Token {
                address,
                decimals: self.decimals,
            },
            (None, None) => Asset::Native,
        };
        let amount = match asset {
            Asset::Nft { .. } => parse_quantity(&self.amount)?,
            _ => to_base_units(&self.amount, self.decimals)?,
        };

        let mut draft = DraftTransaction::new(asset, !self.legacy).with_amount(amount);
        draft.recipient = self.to;
        draft.from_account = Some(self.from);
        draft.user_input_hex_data = self.data.as_deref().map(parse_hex_data).transpose()?;
        draft.gas.gas_limit = optional_quantity(&self.gas_limit)?.unwrap_or_default();
        draft.gas.gas_price = optional_quantity(&self.gas_price)?;
        draft.gas.max_fee_per_gas = optional_quantity(&self.max_fee)?;
        draft.gas.max_priority_fee_per_gas = optional_quantity(&self.priority_fee)?;
        Ok(draft)
    }
}

fn optional_quantity(value: &Option<String>) -> Result<Option<ethers_core::types::U256>, AppError> {
    value.as_deref().map(parse_quantity).transpose()
}

#[derive(Debug, Args)]
pub struct BalanceArgs {
    #[arg(long, value_name = "ADDRESS")]
    pub address: Address,
    /// ERC-20 contract; the native asset when omitted.
    #[arg(long, value_name = "ADDRESS")]
    pub token: Option<Address>,
    #[arg(long, default_value_t = 18)]
    pub decimals: u8,
    /// Chain the token lives on; defaults to the connected chain.
    #[arg(long)]
    pub chain_id: Option<u64>,
}
