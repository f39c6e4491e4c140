/// KECCAK HASHING & 256-BIT WORDS
///
/// Every commitment in the storage-mining protocol is a keccak-256 digest over
/// ABI-style 32-byte words. The helpers here keep the word layout in one place:
/// - addresses are left-padded to 32 bytes
/// - integers are big-endian
/// - hashes are copied verbatim

use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

/// Size of one ABI word / one sample chunk.
pub const WORD_SIZE: usize = 32;

/// keccak-256 of a byte string
pub fn keccak256(data: &[u8]) -> H256 {
    let digest = Keccak256::digest(data);
    H256::from_slice(&digest)
}

/// keccak-256 over the concatenation of several 32-byte words
pub fn keccak_words(words: &[[u8; WORD_SIZE]]) -> H256 {
    let mut hasher = Keccak256::new();
    for word in words {
        hasher.update(word);
    }
    H256::from_slice(&hasher.finalize())
}

/// Big-endian word of an unsigned integer
pub fn u256_word(value: U256) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    value.to_big_endian(&mut word);
    word
}

/// Address left-padded to a full word
pub fn address_word(address: H160) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

pub fn h256_word(hash: H256) -> [u8; WORD_SIZE] {
    hash.to_fixed_bytes()
}

pub fn h256_to_u256(hash: H256) -> U256 {
    U256::from_big_endian(hash.as_bytes())
}

pub fn u256_to_h256(value: U256) -> H256 {
    H256::from(u256_word(value))
}

/// Parses `0x`-prefixed or bare hex into a word, left-padding short input.
pub fn parse_h256(input: &str) -> Result<H256, hex::FromHexError> {
    let trimmed = input.trim_start_matches("0x");
    let padded = if trimmed.len() % 2 == 1 {
        format!("0{}", trimmed)
    } else {
        trimmed.to_string()
    };
    let bytes = hex::decode(padded)?;
    if bytes.len() > WORD_SIZE {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    let mut word = [0u8; WORD_SIZE];
    word[WORD_SIZE - bytes.len()..].copy_from_slice(&bytes);
    Ok(H256::from(word))
}
