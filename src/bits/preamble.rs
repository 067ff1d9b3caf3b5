//! Preamble search under bit and byte order ambiguity
//!
//! The matcher precomputes the on-wire value of the sync pattern for every
//! enabled [`TransformMode`] and then, for each configured bit alignment,
//! slides a 32-bit register across the window comparing it exactly against
//! that table. Only exact 32-bit equality confirms a match, so partial bit
//! patterns inside payload data never count.

use super::align::read_u32_at;
use super::transform::compose_transform;
use crate::{DecodeError, Result, TransformMode};
use tracing::trace;

/// Length of the preamble in bytes.
pub const PREAMBLE_LEN: usize = 4;

/// Length of the preamble in bits.
pub const PREAMBLE_BITS: u64 = 32;

/// One confirmed preamble position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreambleMatch {
    /// Byte holding the first preamble bit.
    pub byte_offset: usize,
    /// Bit within that byte, 0 = most significant.
    pub bit_offset: u8,
    /// Variant that matched.
    pub mode: TransformMode,
}

impl PreambleMatch {
    /// Absolute bit position of the first preamble bit.
    pub fn bit_position(&self) -> u64 {
        self.byte_offset as u64 * 8 + self.bit_offset as u64
    }

    /// The same match seen from a window starting `base` bytes earlier.
    pub fn offset_by(self, base: usize) -> Self {
        Self { byte_offset: self.byte_offset + base, ..self }
    }
}

/// Stateless preamble finder.
#[derive(Debug, Clone)]
pub struct PreambleMatcher {
    pattern: u32,
    variants: Vec<(TransformMode, u32)>,
    max_bit_shift: u8,
}

impl PreambleMatcher {
    /// Build a matcher for `pattern` under `modes`, trying alignments
    /// `0..=max_bit_shift`.
    ///
    /// Modes whose wire value duplicates an earlier mode's are dropped, so the
    /// first listed mode wins.
    pub fn new(pattern: u32, modes: &[TransformMode], max_bit_shift: u8) -> Result<Self> {
        if modes.is_empty() {
            return Err(DecodeError::config_error("modes", "at least one mode is required"));
        }
        if max_bit_shift > 7 {
            return Err(DecodeError::config_error("max_bit_shift", "must be between 0 and 7"));
        }

        let mut variants: Vec<(TransformMode, u32)> = Vec::with_capacity(modes.len());
        for &mode in modes {
            let wire = compose_transform(pattern, mode);
            if variants.iter().all(|&(_, existing)| existing != wire) {
                variants.push((mode, wire));
            }
        }

        Ok(Self { pattern, variants, max_bit_shift })
    }

    /// Logical sync pattern.
    pub fn pattern(&self) -> u32 {
        self.pattern
    }

    /// Precomputed `(mode, wire value)` pairs.
    pub fn variants(&self) -> &[(TransformMode, u32)] {
        &self.variants
    }

    pub fn max_bit_shift(&self) -> u8 {
        self.max_bit_shift
    }

    /// Bytes needed to test one position at `bit_offset`.
    pub fn required_span(bit_offset: u8) -> usize {
        if bit_offset == 0 { PREAMBLE_LEN } else { PREAMBLE_LEN + 1 }
    }

    /// Bytes needed to test every alignment at one offset.
    pub fn max_span(&self) -> usize {
        Self::required_span(self.max_bit_shift)
    }

    /// Variant whose wire value equals `word`, if any.
    pub fn classify(&self, word: u32) -> Option<TransformMode> {
        self.variants.iter().find(|&&(_, wire)| wire == word).map(|&(mode, _)| mode)
    }

    /// Test a single position.
    pub fn match_at(
        &self,
        window: &[u8],
        byte_offset: usize,
        bit_offset: u8,
    ) -> Option<TransformMode> {
        read_u32_at(window, byte_offset, bit_offset).and_then(|word| self.classify(word))
    }

    /// Every confirmed match in `window`, ordered by bit position.
    ///
    /// Positions too close to the end of the window to be tested are skipped;
    /// callers keep `max_span() - 1` bytes of lookback between windows.
    pub fn find_all(&self, window: &[u8]) -> Vec<PreambleMatch> {
        let mut matches = Vec::new();
        if window.len() < PREAMBLE_LEN {
            return matches;
        }

        for byte_offset in 0..=window.len() - PREAMBLE_LEN {
            // Hits at one byte offset resolve to the same buffer start; keep the lowest shift.
            for bit_offset in 0..=self.max_bit_shift {
                if let Some(mode) = self.match_at(window, byte_offset, bit_offset) {
                    trace!(byte_offset, bit_offset, %mode, "preamble candidate confirmed");
                    matches.push(PreambleMatch { byte_offset, bit_offset, mode });
                    break;
                }
            }
        }
        matches
    }
}
