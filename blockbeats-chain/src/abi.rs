//! Minimal ABI codec
//!
//! The MusicLicense interface is small and fixed, so rather than pulling in a
//! full contract toolkit this module hand-rolls the handful of encodings it
//! needs: Keccak-256 selectors, 32-byte word encode/decode for the static
//! types, and the head/tail layout for the one dynamic `string` argument.

use blockbeats_common::{Address, Error, Result};
use sha3::{Digest, Keccak256};

/// ABI word size in bytes
pub const WORD: usize = 32;

/// Keccak-256 digest
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// First four bytes of the Keccak-256 of a function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Full Keccak-256 of an event signature (topic 0)
pub fn event_topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

/// Left-padded word carrying a u64 quantity
pub fn encode_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Left-padded word carrying a u8 quantity
pub fn encode_u8(value: u8) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[31] = value;
    word
}

/// Left-padded word carrying a 20-byte address
pub fn encode_address(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Indexed-address topic value (same layout as the encoded word)
pub fn address_topic(address: &Address) -> [u8; 32] {
    encode_address(address)
}

/// Dynamic string tail: length word followed by the UTF-8 bytes padded to a
/// word boundary
pub fn encode_string_tail(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(WORD + padded_len(bytes.len()));
    out.extend_from_slice(&encode_u64(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded_len(bytes.len()), 0);
    out
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// One 32-byte word at word index `index`
pub fn word_at(data: &[u8], index: usize) -> Result<&[u8]> {
    let start = index * WORD;
    data.get(start..start + WORD)
        .ok_or_else(|| Error::Abi(format!("Return data too short for word {}", index)))
}

/// Decode a u64 quantity, rejecting values that overflow
pub fn decode_u64(word: &[u8]) -> Result<u64> {
    if word.len() != WORD {
        return Err(Error::Abi(format!("Expected 32-byte word, got {}", word.len())));
    }
    if word[..24].iter().any(|b| *b != 0) {
        return Err(Error::Abi("Quantity exceeds u64 range".to_string()));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(bytes))
}

pub fn decode_bool(word: &[u8]) -> Result<bool> {
    Ok(decode_u64(word)? != 0)
}

pub fn decode_address(word: &[u8]) -> Result<Address> {
    if word.len() != WORD {
        return Err(Error::Abi(format!("Expected 32-byte word, got {}", word.len())));
    }
    if word[..12].iter().any(|b| *b != 0) {
        return Err(Error::Abi("Address word has nonzero padding".to_string()));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address(bytes))
}

/// Decode a dynamic string whose offset word sits at word index
/// `offset_word_index` of `data`
pub fn decode_string(data: &[u8], offset_word_index: usize) -> Result<String> {
    let offset = decode_u64(word_at(data, offset_word_index)?)? as usize;
    let len_word = data
        .get(offset..offset + WORD)
        .ok_or_else(|| Error::Abi("String offset out of range".to_string()))?;
    let len = decode_u64(len_word)? as usize;
    let bytes = data
        .get(offset + WORD..offset + WORD + len)
        .ok_or_else(|| Error::Abi("String length out of range".to_string()))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| Error::Abi(format!("Invalid UTF-8 string: {}", e)))
}
