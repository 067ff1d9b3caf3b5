//! Recoverable conditions reported alongside normal output

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recoverable condition observed while decoding a capture.
///
/// None of these stop the pipeline. They are surfaced so a caller can decide
/// whether to trust, discard or log the affected output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// The final read returned fewer bytes than a full chunk.
    TruncatedRead { requested: usize, received: usize },

    /// End of input reached without a single confirmed preamble.
    NoPreambleFound { bytes_scanned: u64 },

    /// Buffer length deviates from the configured size beyond tolerance.
    DesynchronizedBuffer {
        buffer_index: u64,
        stream_offset: u64,
        bit_len: u64,
        expected_bits: u64,
    },

    /// Header bytes shorter than the fixed field width.
    MalformedHeader { buffer_index: u64, expected: usize, found: usize },

    /// `buffer_count` outside the valid range.
    BufferCountOutOfRange { buffer_index: u64, buffer_count: u32 },

    /// Header frame number went backwards.
    FrameNumberRegression { buffer_index: u64, previous: u32, current: u32 },

    /// Header frame number skipped one or more values.
    FrameNumberGap { buffer_index: u64, previous: u32, current: u32 },

    /// A frame was zero-padded at end of stream.
    PartialFrame { frame_index: u64, padded: usize },
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticEvent::TruncatedRead { requested, received } => {
                write!(f, "truncated read: {} of {} bytes", received, requested)
            }
            DiagnosticEvent::NoPreambleFound { bytes_scanned } => {
                write!(f, "no preamble found in {} bytes", bytes_scanned)
            }
            DiagnosticEvent::DesynchronizedBuffer {
                buffer_index,
                stream_offset,
                bit_len,
                expected_bits,
            } => write!(
                f,
                "buffer {} at {:#x} is {} bits, expected {}",
                buffer_index, stream_offset, bit_len, expected_bits
            ),
            DiagnosticEvent::MalformedHeader { buffer_index, expected, found } => write!(
                f,
                "buffer {} header has {} bytes, expected {}",
                buffer_index, found, expected
            ),
            DiagnosticEvent::BufferCountOutOfRange { buffer_index, buffer_count } => {
                write!(f, "buffer {} has buffer_count {}", buffer_index, buffer_count)
            }
            DiagnosticEvent::FrameNumberRegression { buffer_index, previous, current } => write!(
                f,
                "frame number regressed from {} to {} at buffer {}",
                previous, current, buffer_index
            ),
            DiagnosticEvent::FrameNumberGap { buffer_index, previous, current } => write!(
                f,
                "frame number jumped from {} to {} at buffer {}",
                previous, current, buffer_index
            ),
            DiagnosticEvent::PartialFrame { frame_index, padded } => {
                write!(f, "frame {} padded with {} samples", frame_index, padded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let event = DiagnosticEvent::FrameNumberGap { buffer_index: 3, previous: 6, current: 9 };
        let yaml = serde_yaml_ng::to_string(&event).unwrap();
        assert!(yaml.contains("kind: frame_number_gap"));
        assert!(yaml.contains("previous: 6"));

        let back: DiagnosticEvent = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn display_mentions_values() {
        let event = DiagnosticEvent::PartialFrame { frame_index: 2, padded: 17 };
        assert_eq!(event.to_string(), "frame 2 padded with 17 samples");
    }
}
