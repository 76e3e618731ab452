use crate::errors::error::AppError;
use crate::services::tx::calldata::{erc20_transfer, erc721_transfer_from, erc1155_safe_transfer_from};
use crate::services::tx::types::{Asset, DraftGas, DraftTransaction, FeeFields, NftStandard, TransactionParams};
use ethers_core::types::{Address, Bytes, U256};

/// 一次调用的目标、金额与数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTarget {
    pub to: Address,
    pub value: U256,
    pub data: Option<Bytes>,
}

/// 草稿 -> 交易参数，纯函数
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionBuilder;

impl TransactionBuilder {
    pub fn build(
        &self,
        draft: &DraftTransaction,
        signer_default_address: Address,
    ) -> Result<TransactionParams, AppError> {
        let from = draft.from_account.unwrap_or(signer_default_address);
        let recipient = draft
            .recipient
            .ok_or_else(|| AppError::InvalidRequest("缺少收款地址".to_string()))?;
        let call = resolve_call(draft, from, recipient);

        Ok(TransactionParams {
            from,
            to: call.to,
            value: call.value,
            data: call.data,
            // gas limit 无论哪种手续费模型都原样复制
            gas: draft.gas.gas_limit,
            fees: fee_fields(&draft.gas, draft.eip1559support),
        })
    }
}

/// 按资产类型决定 to/value/data
pub(crate) fn resolve_call(draft: &DraftTransaction, from: Address, recipient: Address) -> CallTarget {
    match &draft.asset {
        Asset::Native => CallTarget {
            to: recipient,
            value: draft.amount,
            data: draft
                .user_input_hex_data
                .clone()
                .filter(|data| !data.is_empty()),
        },
        Asset::Token { address, .. } => CallTarget {
            to: *address,
            value: U256::zero(),
            data: Some(erc20_transfer(recipient, draft.amount)),
        },
        Asset::Nft {
            address,
            standard,
            token_id,
        } => {
            let data = match standard {
                NftStandard::Erc721 => erc721_transfer_from(from, recipient, *token_id),
                NftStandard::Erc1155 => {
                    erc1155_safe_transfer_from(from, recipient, *token_id, draft.amount)
                }
            };
            CallTarget {
                to: *address,
                value: U256::zero(),
                data: Some(data),
            }
        }
    }
}

fn non_zero(value: Option<U256>) -> Option<U256> {
    value.filter(|v| !v.is_zero())
}

fn fee_fields(gas: &DraftGas, eip1559support: bool) -> FeeFields {
    if eip1559support {
        let max_fee_per_gas = non_zero(gas.max_fee_per_gas).or(non_zero(gas.gas_price));
        let max_priority_fee_per_gas = non_zero(gas.max_priority_fee_per_gas).or(max_fee_per_gas);
        FeeFields::FeeMarket {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        }
    } else {
        FeeFields::Legacy {
            gas_price: non_zero(gas.gas_price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GWEI: u64 = 1_000_000_000;

    fn signer() -> Address {
        Address::repeat_byte(0x0a)
    }

    fn recipient() -> Address {
        Address::repeat_byte(0x0b)
    }

    fn nft(standard: NftStandard) -> Asset {
        Asset::Nft {
            address: Address::repeat_byte(0xcc),
            standard,
            token_id: U256::from(7779u64),
        }
    }

    fn all_assets() -> Vec<Asset> {
        vec![
            Asset::Native,
            Asset::Token {
                address: Address::repeat_byte(0xdd),
                decimals: 6,
            },
            nft(NftStandard::Erc721),
            nft(NftStandard::Erc1155),
        ]
    }

    #[test]
    fn native_send_uses_recipient_and_amount() {
        let draft = DraftTransaction::new(Asset::Native, false)
            .with_recipient(recipient())
            .with_amount(U256::from(GWEI));
        let params = TransactionBuilder.build(&draft, signer()).unwrap();
        assert_eq!(params.from, signer());
        assert_eq!(params.to, recipient());
        assert_eq!(params.value, U256::from(GWEI));
        assert_eq!(params.data, None);
    }

    #[test]
    fn native_send_keeps_user_hex_data() {
        let mut draft = DraftTransaction::new(Asset::Native, false).with_recipient(recipient());
        draft.user_input_hex_data = Some(Bytes::from(vec![0xab, 0xcd]));
        let params = TransactionBuilder.build(&draft, signer()).unwrap();
        assert_eq!(params.data, Some(Bytes::from(vec![0xab, 0xcd])));
    }

    #[test]
    fn from_override_wins_over_signer() {
        let mut draft = DraftTransaction::new(Asset::Native, false).with_recipient(recipient());
        draft.from_account = Some(Address::repeat_byte(0x0f));
        let params = TransactionBuilder.build(&draft, signer()).unwrap();
        assert_eq!(params.from, Address::repeat_byte(0x0f));
    }

    #[test]
    fn token_send_targets_contract_with_zero_value() {
        let draft = DraftTransaction::new(all_assets()[1].clone(), false)
            .with_recipient(recipient())
            .with_amount(U256::from(5_000_000u64));
        let params = TransactionBuilder.build(&draft, signer()).unwrap();
        assert_eq!(params.to, Address::repeat_byte(0xdd));
        assert!(params.value.is_zero());
        assert_eq!(params.data, Some(erc20_transfer(recipient(), U256::from(5_000_000u64))));
    }

    #[test]
    fn erc721_send_encodes_token_id_7779() {
        let draft = DraftTransaction::new(nft(NftStandard::Erc721), true).with_recipient(recipient());
        let params = TransactionBuilder.build(&draft, signer()).unwrap();
        assert_eq!(params.to, Address::repeat_byte(0xcc));
        assert!(params.value.is_zero());
        let data = params.data.unwrap();
        assert_eq!(hex::encode(&data[..4]), "23b872dd");
        assert_eq!(U256::from_big_endian(&data[68..100]), U256::from(7779u64));

        let json = serde_json::to_value(TransactionBuilder.build(&draft, signer()).unwrap()).unwrap();
        assert_eq!(json["value"], "0x0");
    }

    #[test]
    fn erc1155_send_uses_hex_amount() {
        let draft = DraftTransaction::new(nft(NftStandard::Erc1155), false)
            .with_recipient(recipient())
            .with_amount_hex("0x3")
            .unwrap();
        let params = TransactionBuilder.build(&draft, signer()).unwrap();
        assert_eq!(
            params.data,
            Some(erc1155_safe_transfer_from(
                signer(),
                recipient(),
                U256::from(7779u64),
                U256::from(3u64)
            ))
        );
    }

    #[test]
    fn missing_recipient_is_invalid_request() {
        let draft = DraftTransaction::new(Asset::Native, true);
        assert!(matches!(
            TransactionBuilder.build(&draft, signer()),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn fee_market_defaults_from_gas_price() {
        let mut draft = DraftTransaction::new(Asset::Native, true).with_recipient(recipient());
        draft.gas.gas_price = Some(U256::from(30 * GWEI));
        draft.gas.max_fee_per_gas = Some(U256::zero());
        let params = TransactionBuilder.build(&draft, signer()).unwrap();
        assert_eq!(
            params.fees,
            FeeFields::FeeMarket {
                max_fee_per_gas: Some(U256::from(30 * GWEI)),
                max_priority_fee_per_gas: Some(U256::from(30 * GWEI)),
            }
        );
    }

    #[test]
    fn explicit_priority_fee_is_kept() {
        let mut draft = DraftTransaction::new(Asset::Native, true).with_recipient(recipient());
        draft.gas.max_fee_per_gas = Some(U256::from(40 * GWEI));
        draft.gas.max_priority_fee_per_gas = Some(U256::from(2 * GWEI));
        draft.gas.gas_price = Some(U256::from(30 * GWEI));
        let params = TransactionBuilder.build(&draft, signer()).unwrap();
        assert_eq!(
            params.fees,
            FeeFields::FeeMarket {
                max_fee_per_gas: Some(U256::from(40 * GWEI)),
                max_priority_fee_per_gas: Some(U256::from(2 * GWEI)),
            }
        );
    }

    #[test]
    fn exactly_one_fee_branch_for_every_combination() {
        let gas_values = [None, Some(U256::zero()), Some(U256::from(GWEI))];
        for asset in all_assets() {
            for eip1559support in [false, true] {
                for gas_price in gas_values {
                    for max_fee in gas_values {
                        for tip in gas_values {
                            let mut draft = DraftTransaction::new(asset.clone(), eip1559support)
                                .with_recipient(recipient())
                                .with_amount(U256::one());
                            draft.gas = DraftGas {
                                gas_limit: U256::from(55_555u64),
                                gas_price,
                                max_fee_per_gas: max_fee,
                                max_priority_fee_per_gas: tip,
                            };
                            let params = TransactionBuilder.build(&draft, signer()).unwrap();
                            assert_eq!(params.gas, U256::from(55_555u64));
                            assert_eq!(params.fees.is_fee_market(), eip1559support);

                            let json = serde_json::to_value(&params).unwrap();
                            let legacy = json.get("gasPrice").is_some();
                            let market = json.get("maxFeePerGas").is_some()
                                || json.get("maxPriorityFeePerGas").is_some();
                            assert!(!(legacy && market), "{}", json);
                            let expected_type = if eip1559support { "0x2" } else { "0x0" };
                            assert_eq!(json["type"], expected_type);
                        }
                    }
                }
            }
        }
    }
}
