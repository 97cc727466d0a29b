//! Minimal Solidity ABI encoding for the contract calls this crate makes.
//!
//! Only the types the supply-chain contract uses are supported: `uint256`
//! (values that fit in a `u128`), `bytes32`, `address` and `string`.
//! Decoding works on raw return data with explicit byte offsets.

use sha3::{Digest, Keccak256};
use tracechain_canonical::Address;

use crate::LedgerError;

/// Size of one ABI word.
pub const WORD: usize = 32;

/// One call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `uint256`.
    Uint(u128),
    /// `bytes32`.
    FixedBytes([u8; 32]),
    /// `string`.
    String(String),
}

/// First four bytes of the Keccak-256 hash of a function signature.
///
/// ```rust
/// use tracechain_ledger::abi::selector;
///
/// assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
/// ```
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

/// Big-endian `uint256` word.
pub fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Encodes arguments using head/tail layout.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = WORD * tokens.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::FixedBytes(bytes) => head.extend_from_slice(bytes),
            Token::String(s) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
                tail.extend_from_slice(&uint_word(s.len() as u128));
                tail.extend_from_slice(s.as_bytes());
                let padding = (WORD - s.len() % WORD) % WORD;
                tail.resize(tail.len() + padding, 0);
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Selector followed by the encoded arguments.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend_from_slice(&encode(tokens));
    data
}

fn malformed(what: String) -> LedgerError {
    LedgerError::InvalidResponse(format!("malformed ABI data: {}", what))
}

/// The word starting at byte `offset` of `data`.
pub fn word_at(data: &[u8], offset: usize) -> Result<&[u8; WORD], LedgerError> {
    offset
        .checked_add(WORD)
        .and_then(|end| data.get(offset..end))
        .and_then(|word| word.try_into().ok())
        .ok_or_else(|| malformed(format!("no word at offset {} of {} bytes", offset, data.len())))
}

/// Returns `true` if every byte of the word is zero.
pub fn is_zero(word: &[u8; WORD]) -> bool {
    word.iter().all(|b| *b == 0)
}

/// Decodes a `uint256` that fits in a `u128`.
pub fn decode_uint(word: &[u8; WORD]) -> Result<u128, LedgerError> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(malformed("uint256 does not fit in 128 bits".to_string()));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

/// Decodes a `uint256` used as an offset or length.
pub fn decode_usize(word: &[u8; WORD]) -> Result<usize, LedgerError> {
    let value = decode_uint(word)?;
    usize::try_from(value).map_err(|_| malformed(format!("offset {} out of range", value)))
}

/// Decodes an `address` word.
pub fn decode_address(word: &[u8; WORD]) -> Result<Address, LedgerError> {
    if word[..12].iter().any(|b| *b != 0) {
        return Err(malformed("address has non-zero padding".to_string()));
    }
    Ok(Address::new(format!("0x{}", hex::encode(&word[12..]))))
}

/// Decodes the `string` whose length word starts at byte `offset`.
pub fn decode_string(data: &[u8], offset: usize) -> Result<String, LedgerError> {
    let len = decode_usize(word_at(data, offset)?)?;
    let start = offset.saturating_add(WORD);
    let bytes = start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| malformed(format!("string of {} bytes runs past the data", len)))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| malformed(format!("string is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_selectors() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(hex::encode(selector("balanceOf(address)")), "70a08231");
    }

    #[test]
    fn static_arguments_are_inline() {
        let hash = [0xab; 32];
        let encoded = encode(&[Token::Uint(2), Token::FixedBytes(hash)]);
        assert_eq!(encoded.len(), 64);
        assert_eq!(encoded[31], 2);
        assert!(encoded[..31].iter().all(|b| *b == 0));
        assert_eq!(&encoded[32..], &hash);
    }

    #[test]
    fn strings_go_to_the_tail() {
        let encoded = encode(&[Token::Uint(1), Token::String("temp:2-8C".into())]);
        // head: id, offset; tail: length, padded bytes
        assert_eq!(encoded.len(), 4 * WORD);
        assert_eq!(&encoded[..32], &uint_word(1));
        assert_eq!(&encoded[32..64], &uint_word(64));
        assert_eq!(&encoded[64..96], &uint_word(9));
        assert_eq!(&encoded[96..105], b"temp:2-8C");
        assert!(encoded[105..].iter().all(|b| *b == 0));
    }

    #[test]
    fn empty_string_has_no_data_words() {
        let encoded = encode(&[Token::Uint(1), Token::String(String::new())]);
        assert_eq!(encoded.len(), 3 * WORD);
        assert_eq!(&encoded[64..], &uint_word(0));
    }

    #[test]
    fn word_aligned_string_gets_no_padding() {
        let s = "x".repeat(32);
        let encoded = encode(&[Token::String(s)]);
        assert_eq!(encoded.len(), 3 * WORD);
    }

    #[test]
    fn decodes_what_encode_writes() {
        let encoded = encode(&[Token::Uint(9), Token::String("temp:2-8C".into())]);
        assert_eq!(decode_uint(word_at(&encoded, 0).unwrap()).unwrap(), 9);
        let offset = decode_usize(word_at(&encoded, WORD).unwrap()).unwrap();
        assert_eq!(decode_string(&encoded, offset).unwrap(), "temp:2-8C");
    }

    #[test]
    fn truncated_data_is_rejected() {
        let encoded = encode(&[Token::String("temp:2-8C".into())]);
        assert!(word_at(&encoded[..40], WORD).is_err());
        assert!(decode_string(&encoded[..70], WORD).is_err());
        assert!(word_at(&encoded, usize::MAX).is_err());
    }

    #[test]
    fn address_words() {
        let mut word = [0u8; WORD];
        word[12..].copy_from_slice(&[0x11; 20]);
        assert_eq!(
            decode_address(&word).unwrap().as_ref(),
            format!("0x{}", "11".repeat(20))
        );
        word[0] = 1;
        assert!(decode_address(&word).is_err());
        assert!(decode_uint(&word).is_err());
    }

    #[test]
    fn call_data_starts_with_selector() {
        let data = encode_call("recordProof(uint256,bytes32)", &[Token::Uint(7), Token::FixedBytes([0; 32])]);
        assert_eq!(&data[..4], &selector("recordProof(uint256,bytes32)"));
        assert_eq!(data.len(), 4 + 64);
    }
}
