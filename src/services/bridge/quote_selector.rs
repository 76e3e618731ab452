use crate::models::Quote;
use crate::utils::{format_token_amount, from_base_units};
use std::cmp::Ordering;

/// 目标金额展示精度
const TO_AMOUNT_PRECISION: u8 = 3;

/// 推荐报价的排序规则：
/// 1. 目标代币到账数量（按 decimals 换算成人类单位）越多越好
/// 2. 预估 gas 越少越好
/// 3. 越早拿到的报价越优先
/// 4. 到达顺序
///
/// gas 没有换算成目标代币计价的总成本（没有价格源），只按原始 gas 数值比较。
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteSelector;

impl QuoteSelector {
    /// 不改变入参顺序
    pub fn recommended<'a>(&self, quotes: &'a [Quote]) -> Option<&'a Quote> {
        quotes
            .iter()
            .enumerate()
            .min_by(|(ia, a), (ib, b)| rank(a, b).then(ia.cmp(ib)))
            .map(|(_, quote)| quote)
    }

    /// 排好序的副本，最优在前
    pub fn sorted(&self, quotes: &[Quote]) -> Vec<Quote> {
        let mut ranked = quotes.to_vec();
        // 稳定排序，到达顺序作为最后的 tie-break
        ranked.sort_by(rank);
        ranked
    }

    /// 推荐报价的目标金额（展示用）
    pub fn to_amount(&self, quotes: &[Quote]) -> Option<String> {
        self.recommended(quotes).map(|q| {
            format_token_amount(q.dest_token_amount, q.dest_asset.decimals, TO_AMOUNT_PRECISION)
        })
    }
}

fn rank(a: &Quote, b: &Quote) -> Ordering {
    let a_dest = from_base_units(a.dest_token_amount, a.dest_asset.decimals);
    let b_dest = from_base_units(b.dest_token_amount, b.dest_asset.decimals);
    b_dest
        .cmp(&a_dest)
        .then_with(|| a.estimated_gas.cmp(&b.estimated_gas))
        .then_with(|| a.fetched_at_ms.cmp(&b.fetched_at_ms))
}
