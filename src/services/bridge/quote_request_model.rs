use crate::models::{QuoteRequest, QuoteRequestUpdate};
use crate::utils::is_positive_base_amount;

/// 报价请求的合并、校验与重置（纯函数，无副作用）
#[derive(Debug, Clone, Copy)]
pub struct QuoteRequestModel {
    cross_chain_required: bool,
}

impl QuoteRequestModel {
    pub fn new(cross_chain_required: bool) -> Self {
        Self { cross_chain_required }
    }

    pub fn bridge() -> Self {
        Self::new(true)
    }

    /// 只覆盖 update 中出现的字段，已设置的字段不会被清空
    pub fn update(&self, current: &QuoteRequest, update: QuoteRequestUpdate) -> QuoteRequest {
        QuoteRequest {
            wallet_address: update.wallet_address.or(current.wallet_address),
            src_chain_id: update.src_chain_id.or(current.src_chain_id),
            dest_chain_id: update.dest_chain_id.or(current.dest_chain_id),
            src_token_address: update.src_token_address.or(current.src_token_address),
            dest_token_address: update.dest_token_address.or(current.dest_token_address),
            src_token_amount: update
                .src_token_amount
                .or_else(|| current.src_token_amount.clone()),
            slippage: update.slippage.unwrap_or(current.slippage),
        }
    }

    /// 发起任何网络请求前的唯一闸门
    pub fn is_valid(&self, request: &QuoteRequest) -> bool {
        let (Some(src_chain), Some(dest_chain)) = (request.src_chain_id, request.dest_chain_id)
        else {
            return false;
        };
        if src_chain == 0 || dest_chain == 0 {
            return false;
        }
        if self.cross_chain_required && src_chain == dest_chain {
            return false;
        }
        request.src_token_address.is_some()
            && request.dest_token_address.is_some()
            && request
                .src_token_amount
                .as_deref()
                .is_some_and(is_positive_base_amount)
    }

    pub fn reset(&self) -> QuoteRequest {
        QuoteRequest::default()
    }

    /// 交换源/目标的链与代币，金额需要重新输入
    pub fn switch_tokens(&self, current: &QuoteRequest) -> QuoteRequest {
        QuoteRequest {
            src_chain_id: current.dest_chain_id,
            dest_chain_id: current.src_chain_id,
            src_token_address: current.dest_token_address,
            dest_token_address: current.src_token_address,
            src_token_amount: None,
            ..current.clone()
        }
    }
}

impl Default for QuoteRequestModel {
    fn default() -> Self {
        Self::bridge()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NATIVE_TOKEN_ADDRESS;
    use crate::models::domain::quote_request::DEFAULT_SLIPPAGE;
    use ethers_core::types::Address;

    fn complete() -> QuoteRequest {
        QuoteRequest {
            wallet_address: Some(Address::repeat_byte(0x11)),
            src_chain_id: Some(1),
            dest_chain_id: Some(10),
            src_token_address: Some(NATIVE_TOKEN_ADDRESS),
            dest_token_address: Some(Address::repeat_byte(0x22)),
            src_token_amount: Some("1000000".to_string()),
            slippage: DEFAULT_SLIPPAGE,
        }
    }

    #[test]
    fn complete_request_is_valid() {
        assert!(QuoteRequestModel::bridge().is_valid(&complete()));
    }

    #[test]
    fn missing_any_required_field_is_invalid() {
        let model = QuoteRequestModel::bridge();
        let mutations: Vec<fn(&mut QuoteRequest)> = vec![
            |r| r.src_chain_id = None,
            |r| r.dest_chain_id = None,
            |r| r.src_token_address = None,
            |r| r.dest_token_address = None,
            |r| r.src_token_amount = None,
            |r| r.src_token_amount = Some(String::new()),
            |r| r.src_token_amount = Some("0".to_string()),
            |r| r.src_chain_id = Some(0),
        ];
        for mutate in mutations {
            let mut request = complete();
            mutate(&mut request);
            assert!(!model.is_valid(&request), "{:?}", request);
        }
    }

    #[test]
    fn equal_chains_rejected_when_cross_chain_required() {
        let mut request = complete();
        request.dest_chain_id = Some(1);
        assert!(!QuoteRequestModel::new(true).is_valid(&request));
        assert!(QuoteRequestModel::new(false).is_valid(&request));
    }

    #[test]
    fn update_merges_without_dropping_fields() {
        let model = QuoteRequestModel::bridge();
        let current = complete();
        let next = model.update(
            &current,
            QuoteRequestUpdate {
                dest_chain_id: Some(137),
                ..Default::default()
            },
        );
        assert_eq!(next.dest_chain_id, Some(137));
        assert_eq!(next.src_token_amount, current.src_token_amount);
        assert_eq!(next.wallet_address, current.wallet_address);
    }

    #[test]
    fn reset_returns_defaults() {
        let request = QuoteRequestModel::bridge().reset();
        assert_eq!(request.wallet_address, None);
        assert_eq!(request.src_token_address, Some(NATIVE_TOKEN_ADDRESS));
        assert_eq!(request.slippage, 0.5);
    }

    #[test]
    fn switch_tokens_swaps_sides_and_clears_amount() {
        let switched = QuoteRequestModel::bridge().switch_tokens(&complete());
        assert_eq!(switched.src_chain_id, Some(10));
        assert_eq!(switched.dest_token_address, Some(NATIVE_TOKEN_ADDRESS));
        assert_eq!(switched.src_token_amount, None);
    }
}
