//! Bit-level primitives: transforms, alignment and preamble search
//!
//! These are pure functions over byte slices with no I/O; the
//! [`capture`](crate::capture) module builds the streaming reader on top.

pub mod align;
pub mod preamble;
pub mod transform;

pub use align::{extract_bits, read_u32_at, shift_right};
pub use preamble::{PREAMBLE_BITS, PREAMBLE_LEN, PreambleMatch, PreambleMatcher};
pub use transform::{
    compose_transform, decode_word, encode_word, inverse_transform, reverse_bits,
    reverse_bits_in_bytes, reverse_bytes,
};
