//! ERC-20 / ERC-721 / ERC-1155 调用数据编码
use crate::errors::error::AppError;
use ethers_core::abi::{Token, encode};
use ethers_core::types::{Address, Bytes, U256};
use ethers_core::utils::keccak256;
use once_cell::sync::Lazy;

static ERC20_TRANSFER: Lazy<[u8; 4]> = Lazy::new(|| selector("transfer(address,uint256)"));
static ERC20_BALANCE_OF: Lazy<[u8; 4]> = Lazy::new(|| selector("balanceOf(address)"));
static ERC721_TRANSFER_FROM: Lazy<[u8; 4]> =
    Lazy::new(|| selector("transferFrom(address,address,uint256)"));
static ERC1155_SAFE_TRANSFER_FROM: Lazy<[u8; 4]> =
    Lazy::new(|| selector("safeTransferFrom(address,address,uint256,uint256,bytes)"));

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature);
    [hash[0], hash[1], hash[2], hash[3]]
}

fn with_selector(selector: &[u8; 4], args: &[Token]) -> Bytes {
    let encoded = encode(args);
    let mut data = Vec::with_capacity(4 + encoded.len());
    data.extend_from_slice(selector);
    data.extend_from_slice(&encoded);
    data.into()
}

/// transfer(to, amount)，4 + 32 + 32 = 68 字节
pub fn erc20_transfer(to: Address, amount: U256) -> Bytes {
    with_selector(&ERC20_TRANSFER, &[Token::Address(to), Token::Uint(amount)])
}

pub fn erc20_balance_of(owner: Address) -> Bytes {
    with_selector(&ERC20_BALANCE_OF, &[Token::Address(owner)])
}

pub fn erc721_transfer_from(from: Address, to: Address, token_id: U256) -> Bytes {
    with_selector(
        &ERC721_TRANSFER_FROM,
        &[Token::Address(from), Token::Address(to), Token::Uint(token_id)],
    )
}

/// data 参数固定为空 bytes
pub fn erc1155_safe_transfer_from(from: Address, to: Address, id: U256, amount: U256) -> Bytes {
    with_selector(
        &ERC1155_SAFE_TRANSFER_FROM,
        &[
            Token::Address(from),
            Token::Address(to),
            Token::Uint(id),
            Token::Uint(amount),
            Token::Bytes(Vec::new()),
        ],
    )
}

/// eth_call 返回的单个 uint256
pub fn decode_uint(output: &[u8]) -> Result<U256, AppError> {
    if output.len() < 32 {
        return Err(AppError::InvalidHex(format!(
            "uint256 返回值长度不足: {} 字节",
            output.len()
        )));
    }
    Ok(U256::from_big_endian(&output[..32]))
}
