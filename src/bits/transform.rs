//! Bit and byte order transforms
//!
//! Every on-wire variant is built from two primitives, bit reversal within a
//! byte and byte reversal within a word. Both are involutions and they
//! commute, so each [`TransformMode`] is its own inverse.
//!
//! Words of `N` bytes are handled as `[u8; N]` with `N` fixed at compile
//! time. The wire form of a word under a mode is the big-endian byte order of
//! the transformed value:
//!
//! ```rust
//! use streamdaq::bits::{compose_transform, decode_word, encode_word};
//! use streamdaq::TransformMode;
//!
//! let wire = compose_transform(0x1234_5678, TransformMode::BitsThenBytes);
//! assert_eq!(wire, 0x1E6A_2C48);
//!
//! let bytes = encode_word::<4>(0x1234_5678, TransformMode::BitsThenBytes);
//! assert_eq!(bytes, wire.to_be_bytes());
//! assert_eq!(decode_word(bytes, TransformMode::BitsThenBytes), 0x1234_5678);
//! ```

use crate::TransformMode;

/// Reverse the bit order of one byte.
#[inline]
pub fn reverse_bits(byte: u8) -> u8 {
    byte.reverse_bits()
}

/// Reverse the byte order of a 32-bit word.
#[inline]
pub fn reverse_bytes(word: u32) -> u32 {
    u32::from_be_bytes(word.to_le_bytes())
}

/// Reverse the bit order within each byte of a 32-bit word, keeping byte order.
#[inline]
pub fn reverse_bits_in_bytes(word: u32) -> u32 {
    u32::from_be_bytes(word.to_be_bytes().map(reverse_bits))
}

/// Apply `mode` to a logical word, producing its on-wire value.
pub fn compose_transform(word: u32, mode: TransformMode) -> u32 {
    let word = if mode.reverses_bits() { reverse_bits_in_bytes(word) } else { word };
    if mode.reverses_bytes() { reverse_bytes(word) } else { word }
}

/// Recover a logical word from its on-wire value.
pub fn inverse_transform(word: u32, mode: TransformMode) -> u32 {
    compose_transform(word, mode)
}

/// Decode one `N`-byte word exactly as it appeared on the wire.
///
/// Bits are reversed per byte and byte order reversed as `mode` says, then the
/// bytes are read most significant first. `N` must be at most 4.
#[inline]
pub fn decode_word<const N: usize>(mut word: [u8; N], mode: TransformMode) -> u32 {
    const { assert!(N >= 1 && N <= 4, "words are 1 to 4 bytes") };
    if mode.reverses_bits() {
        for byte in &mut word {
            *byte = reverse_bits(*byte);
        }
    }
    if mode.reverses_bytes() {
        word.reverse();
    }
    word.iter().fold(0u32, |acc, &byte| (acc << 8) | byte as u32)
}

/// Encode the low `N` bytes of `value` as they appear on the wire.
pub fn encode_word<const N: usize>(value: u32, mode: TransformMode) -> [u8; N] {
    const { assert!(N >= 1 && N <= 4, "words are 1 to 4 bytes") };
    let be = value.to_be_bytes();
    let mut word = [0u8; N];
    word.copy_from_slice(&be[4 - N..]);
    if mode.reverses_bytes() {
        word.reverse();
    }
    if mode.reverses_bits() {
        for byte in &mut word {
            *byte = reverse_bits(*byte);
        }
    }
    word
}
