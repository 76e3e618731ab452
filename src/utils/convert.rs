use crate::errors::error::AppError;
use ethers_core::types::{Address, Bytes, U256};

/// 解析 0x 前缀的十六进制数量（如 "0x1e63"），空串或 "0x" 视为 0
pub fn parse_hex_quantity(value: &str) -> Result<U256, AppError> {
    let digits = strip_hex_prefix(value.trim());
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| AppError::InvalidHex(format!("{}: {}", value, e)))
}

/// 十进制或 0x 十六进制均可
pub fn parse_quantity(value: &str) -> Result<U256, AppError> {
    let v = value.trim();
    if v.starts_with("0x") || v.starts_with("0X") {
        parse_hex_quantity(v)
    } else {
        U256::from_dec_str(v).map_err(|e| AppError::InvalidAmount(format!("{}: {}", value, e)))
    }
}

/// 用户手动输入的 hex data
pub fn parse_hex_data(value: &str) -> Result<Bytes, AppError> {
    let digits = strip_hex_prefix(value.trim());
    Ok(Bytes::from(hex::decode(digits)?))
}

pub fn parse_address(value: &str) -> Result<Address, AppError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| AppError::InvalidAddress(value.to_string()))
}

pub fn to_hex_quantity(value: U256) -> String {
    format!("{:#x}", value)
}

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_hex_quantity("0x1e63").unwrap(), U256::from(7779));
        assert_eq!(parse_hex_quantity("0x").unwrap(), U256::zero());
        assert_eq!(parse_quantity("42").unwrap(), U256::from(42));
        assert_eq!(parse_quantity("0x2a").unwrap(), U256::from(42));
        assert!(parse_hex_quantity("0xzz").is_err());
        assert_eq!(to_hex_quantity(U256::from(255)), "0xff");
    }

    #[test]
    fn parses_hex_data_and_addresses() {
        assert_eq!(parse_hex_data("0xdeadbeef").unwrap().to_vec(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(parse_hex_data("0xabc"), Err(AppError::InvalidHex(_))));
        assert!(parse_address("0x0000000000000000000000000000000000000001").is_ok());
        assert!(matches!(parse_address("nope"), Err(AppError::InvalidAddress(_))));
    }
}
