// services/tx/types.rs

use crate::errors::error::AppError;
use crate::models::QuoteTrade;
use crate::utils::parse_hex_quantity;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, Bytes, Eip1559TransactionRequest, TransactionRequest, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NftStandard {
    #[serde(rename = "ERC721")]
    Erc721,
    #[serde(rename = "ERC1155")]
    Erc1155,
}

impl FromStr for NftStandard {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "").as_str() {
            "ERC721" => Ok(Self::Erc721),
            "ERC1155" => Ok(Self::Erc1155),
            other => Err(AppError::UnsupportedAssetStandard(other.to_string())),
        }
    }
}

impl fmt::Display for NftStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Erc721 => write!(f, "ERC721"),
            Self::Erc1155 => write!(f, "ERC1155"),
        }
    }
}

/// 待发送资产
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    Native,
    Token { address: Address, decimals: u8 },
    Nft { address: Address, standard: NftStandard, token_id: U256 },
}

impl Asset {
    /// 代币/NFT 交易的 `to` 是合约地址
    pub fn contract_address(&self) -> Option<Address> {
        match self {
            Self::Native => None,
            Self::Token { address, .. } | Self::Nft { address, .. } => Some(*address),
        }
    }
}

/// gas 相关字段；零值视为未设置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftGas {
    pub gas_limit: U256,
    pub gas_price: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
}

/// 发送流程中的可变草稿，确认时被消费一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftTransaction {
    pub asset: Asset,
    pub recipient: Option<Address>,
    /// 最小单位；ERC-1155 时为转移数量
    pub amount: U256,
    pub from_account: Option<Address>,
    pub gas: DraftGas,
    /// 仅原生币转账时生效
    pub user_input_hex_data: Option<Bytes>,
    pub eip1559support: bool,
}

impl DraftTransaction {
    pub fn new(asset: Asset, eip1559support: bool) -> Self {
        Self {
            asset,
            recipient: None,
            amount: U256::zero(),
            from_account: None,
            gas: DraftGas::default(),
            user_input_hex_data: None,
            eip1559support,
        }
    }

    /// 由报价中附带的交易生成：原生币 + 调用数据
    pub fn from_trade(trade: &QuoteTrade, eip1559support: bool) -> Self {
        let mut draft = Self::new(Asset::Native, eip1559support);
        draft.recipient = Some(trade.to);
        draft.amount = trade.value;
        draft.user_input_hex_data = Some(trade.data.clone());
        draft.gas.gas_limit = trade.gas_limit.unwrap_or_default();
        draft
    }

    pub fn with_recipient(mut self, recipient: Address) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn with_amount(mut self, amount: U256) -> Self {
        self.amount = amount;
        self
    }

    /// 金额以 hex quantity 形式给出（如 "0x1e63"）
    pub fn with_amount_hex(mut self, amount: &str) -> Result<Self, AppError> {
        self.amount = parse_hex_quantity(amount)?;
        Ok(self)
    }
}

/// 手续费字段，只可能存在其中一支
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeeFields {
    #[serde(rename = "0x0", rename_all = "camelCase")]
    Legacy {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gas_price: Option<U256>,
    },
    #[serde(rename = "0x2", rename_all = "camelCase")]
    FeeMarket {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_fee_per_gas: Option<U256>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_priority_fee_per_gas: Option<U256>,
    },
}

impl FeeFields {
    pub fn is_fee_market(&self) -> bool {
        matches!(self, Self::FeeMarket { .. })
    }
}

/// 交给签名器的最终交易参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParams {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    pub gas: U256,
    #[serde(flatten)]
    pub fees: FeeFields,
}

impl TransactionParams {
    pub fn to_typed_transaction(&self, chain_id: Option<u64>) -> TypedTransaction {
        match &self.fees {
            FeeFields::Legacy { gas_price } => {
                let mut tx = TransactionRequest::new()
                    .from(self.from)
                    .to(self.to)
                    .value(self.value)
                    .gas(self.gas);
                if let Some(price) = gas_price {
                    tx = tx.gas_price(*price);
                }
                if let Some(data) = &self.data {
                    tx = tx.data(data.clone());
                }
                if let Some(id) = chain_id {
                    tx = tx.chain_id(id);
                }
                TypedTransaction::Legacy(tx)
            }
            FeeFields::FeeMarket {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                let mut tx = Eip1559TransactionRequest::new()
                    .from(self.from)
                    .to(self.to)
                    .value(self.value)
                    .gas(self.gas);
                if let Some(fee) = max_fee_per_gas {
                    tx = tx.max_fee_per_gas(*fee);
                }
                if let Some(tip) = max_priority_fee_per_gas {
                    tx = tx.max_priority_fee_per_gas(*tip);
                }
                if let Some(data) = &self.data {
                    tx = tx.data(data.clone());
                }
                if let Some(id) = chain_id {
                    tx = tx.chain_id(id);
                }
                TypedTransaction::Eip1559(tx)
            }
        }
    }
}
