//! 人类可读金额 <-> 链上最小单位（wei 等）之间的精确换算，全程不经过浮点。
use crate::errors::error::AppError;
use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::{BigDecimal, RoundingMode};
use ethers_core::types::U256;
use num_format::{Locale, ToFormattedString};
use std::str::FromStr;

/// 代币最大支持精度
pub const MAX_DECIMALS: u8 = 36;

/// 输入框中小数点后的位数
pub fn count_decimals(input: &str) -> usize {
    input
        .trim()
        .split_once('.')
        .map(|(_, frac)| frac.len())
        .unwrap_or(0)
}

/// 人类单位 -> 最小单位。小数位超过 `decimals` 时直接拒绝，而不是静默截断。
pub fn to_base_units(human: &str, decimals: u8) -> Result<U256, AppError> {
    let input = human.trim();
    if input.is_empty() {
        return Err(AppError::InvalidAmount("empty amount".to_string()));
    }
    if decimals > MAX_DECIMALS {
        return Err(AppError::InvalidAmount(format!("unsupported decimals {}", decimals)));
    }
    let value = BigDecimal::from_str(input)
        .map_err(|e| AppError::InvalidAmount(format!("{}: {}", input, e)))?;
    if value.sign() == Sign::Minus {
        return Err(AppError::InvalidAmount(format!("negative amount {}", input)));
    }
    let (_, scale) = value.normalized().as_bigint_and_exponent();
    if scale > decimals as i64 {
        return Err(AppError::InvalidAmount(format!(
            "{} has more than {} decimals",
            input, decimals
        )));
    }

    let scaled = (value * pow10(decimals)).with_scale(0);
    let (digits, _) = scaled.as_bigint_and_exponent();
    U256::from_dec_str(&digits.to_string())
        .map_err(|e| AppError::InvalidAmount(format!("{} overflows uint256: {}", input, e)))
}

/// 最小单位 -> 人类单位（精确值）
pub fn from_base_units(base: U256, decimals: u8) -> BigDecimal {
    // U256 的十进制字符串必然可被 BigInt 解析
    let digits = BigInt::from_str(&base.to_string()).unwrap_or_default();
    BigDecimal::new(digits, decimals as i64)
}

/// 展示用格式：四舍五入到 `precision` 位，整数部分加千分位
pub fn format_token_amount(base: U256, decimals: u8, precision: u8) -> String {
    let rounded =
        from_base_units(base, decimals).with_scale_round(precision as i64, RoundingMode::HalfUp);
    let (digits, _) = rounded.as_bigint_and_exponent();
    let raw = digits.to_string();
    let width = precision as usize;
    let padded = format!("{:0>w$}", raw, w = width + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - width);

    let int_display = int_part
        .parse::<u128>()
        .map(|v| v.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| int_part.to_string());

    if width == 0 {
        int_display
    } else {
        format!("{}.{}", int_display, frac_part)
    }
}

/// 判断一个十进制的最小单位字符串是否为正整数
pub fn is_positive_base_amount(amount: &str) -> bool {
    U256::from_dec_str(amount.trim())
        .map(|v| !v.is_zero())
        .unwrap_or(false)
}

fn pow10(decimals: u8) -> BigDecimal {
    BigDecimal::new(BigInt::from(1), -(decimals as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_human_to_wei() {
        assert_eq!(
            to_base_units("1.5", 18).unwrap(),
            U256::from_dec_str("1500000000000000000").unwrap()
        );
        assert_eq!(to_base_units("100", 6).unwrap(), U256::from(100_000_000u64));
        assert_eq!(to_base_units("0", 18).unwrap(), U256::zero());
        assert_eq!(to_base_units("7", 0).unwrap(), U256::from(7));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(to_base_units("", 18), Err(AppError::InvalidAmount(_))));
        assert!(matches!(to_base_units("-1", 18), Err(AppError::InvalidAmount(_))));
        assert!(matches!(to_base_units("abc", 18), Err(AppError::InvalidAmount(_))));
        assert!(matches!(to_base_units("0.1234567", 6), Err(AppError::InvalidAmount(_))));
        // 末尾的 0 不计入精度
        assert_eq!(to_base_units("1.500000", 1).unwrap(), U256::from(15));
    }

    #[test]
    fn round_trip_for_all_decimals() {
        let inputs = ["0", "1", "0.5", "123.456", "99999999.000001", "0.000000000000000001"];
        for decimals in 0u8..=18 {
            for input in inputs {
                if count_decimals(input) > decimals as usize {
                    continue;
                }
                let base = to_base_units(input, decimals).unwrap();
                let back = from_base_units(base, decimals);
                assert_eq!(back, BigDecimal::from_str(input).unwrap(), "{} @ {}", input, decimals);
            }
        }
    }

    #[test]
    fn formats_with_precision_and_grouping() {
        let base = U256::from_dec_str("1234567891000000000000").unwrap();
        assert_eq!(format_token_amount(base, 18, 3), "1,234.568");
        assert_eq!(format_token_amount(U256::from(5), 3, 3), "0.005");
        assert_eq!(format_token_amount(U256::from(1_500_000u64), 6, 0), "2");
    }

    #[test]
    fn counts_decimals() {
        assert_eq!(count_decimals("1.234"), 3);
        assert_eq!(count_decimals("12"), 0);
        assert!(is_positive_base_amount("10"));
        assert!(!is_positive_base_amount("0"));
        assert!(!is_positive_base_amount("1.5"));
    }
}
