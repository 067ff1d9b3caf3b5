//! Per-buffer condition flags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Conditions observed while synchronizing and decoding one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct BufferFlags(pub u8);

impl BufferFlags {
    /// Length deviates from the configured buffer size beyond tolerance.
    pub const DESYNCHRONIZED: u8 = 1 << 0;
    /// Header shorter than the fixed field width; fields withheld.
    pub const MALFORMED_HEADER: u8 = 1 << 1;
    /// Payload was zero-padded up to a whole word.
    pub const PAYLOAD_PADDED: u8 = 1 << 2;
    /// `buffer_count` outside `0..=7`.
    pub const BUFFER_COUNT_OUT_OF_RANGE: u8 = 1 << 3;
    /// Last buffer of the stream, bounded by end of input.
    pub const TRAILING: u8 = 1 << 4;
    /// Header frame number lower than the previous buffer's.
    pub const FRAME_NUMBER_REGRESSION: u8 = 1 << 5;
    /// Header frame number skipped ahead.
    pub const FRAME_NUMBER_GAP: u8 = 1 << 6;

    const NAMES: [(u8, &'static str); 7] = [
        (Self::DESYNCHRONIZED, "desynchronized"),
        (Self::MALFORMED_HEADER, "malformed_header"),
        (Self::PAYLOAD_PADDED, "payload_padded"),
        (Self::BUFFER_COUNT_OUT_OF_RANGE, "buffer_count_out_of_range"),
        (Self::TRAILING, "trailing"),
        (Self::FRAME_NUMBER_REGRESSION, "frame_number_regression"),
        (Self::FRAME_NUMBER_GAP, "frame_number_gap"),
    ];

    /// Create an empty flag set.
    pub fn new() -> Self {
        Self(0)
    }

    /// Check if a specific flag is set.
    pub fn has_flag(&self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    /// Set a flag.
    pub fn insert(&mut self, flag: u8) {
        self.0 |= flag;
    }

    /// Whether no flag is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Get the raw value.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Names of the set flags.
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMES.iter().filter(|(flag, _)| self.has_flag(*flag)).map(|(_, name)| *name).collect()
    }
}

impl fmt::Display for BufferFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}
