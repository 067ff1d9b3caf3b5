//! Sub-byte alignment helpers
//!
//! Bit positions count from the most significant bit of byte 0, matching the
//! order the device shifts bits onto the wire.

/// Read 32 bits starting at `bit_offset` (0..=7) within `data[byte_offset]`.
///
/// Returns `None` when the window does not hold all 32 bits.
#[inline]
pub fn read_u32_at(data: &[u8], byte_offset: usize, bit_offset: u8) -> Option<u32> {
    debug_assert!(bit_offset < 8);
    let span = if bit_offset == 0 { 4 } else { 5 };
    let bytes = data.get(byte_offset..byte_offset + span)?;
    let mut register = 0u64;
    for &byte in bytes {
        register = (register << 8) | byte as u64;
    }
    let trailing = (span * 8) as u32 - 32 - bit_offset as u32;
    Some((register >> trailing) as u32)
}

/// Copy bits `start_bit..end_bit` of `data` into a new, byte-aligned vector.
///
/// The last byte is zero-filled when the range is not a whole number of bytes.
/// Bits past the end of `data` read as zero.
pub fn extract_bits(data: &[u8], start_bit: u64, end_bit: u64) -> Vec<u8> {
    let bit_len = end_bit.saturating_sub(start_bit);
    let byte_len = bit_len.div_ceil(8) as usize;
    let first = (start_bit / 8) as usize;
    let shift = (start_bit % 8) as u32;

    let mut out = Vec::with_capacity(byte_len);
    if shift == 0 {
        let available = data.len().saturating_sub(first).min(byte_len);
        out.extend_from_slice(&data[first..first + available]);
        out.resize(byte_len, 0);
    } else {
        for i in 0..byte_len {
            let hi = data.get(first + i).copied().unwrap_or(0);
            let lo = data.get(first + i + 1).copied().unwrap_or(0);
            out.push((hi << shift) | (lo >> (8 - shift)));
        }
    }

    let tail_bits = (bit_len % 8) as u32;
    if tail_bits != 0 {
        if let Some(last) = out.last_mut() {
            *last &= 0xFFu8 << (8 - tail_bits);
        }
    }
    out
}

/// Shift a byte stream right by `bits` (0..=7), filling the vacated leading
/// bits from `lead`'s least significant bits.
///
/// The result is one byte longer when `bits > 0`; trailing bits are zero.
pub fn shift_right(data: &[u8], bits: u8, lead: u8) -> Vec<u8> {
    debug_assert!(bits < 8);
    if bits == 0 {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len() + 1);
    let mut carry = lead << (8 - bits);
    for &byte in data {
        out.push(carry | (byte >> bits));
        carry = byte << (8 - bits);
    }
    out.push(carry);
    out
}
