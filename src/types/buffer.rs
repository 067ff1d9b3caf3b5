//! Buffer types flowing between pipeline stages

use serde::Serialize;

use super::{BufferFlags, DiagnosticEvent, Frame, HeaderFields, TransformMode};

/// A buffer delimited by two consecutive preambles, before decoding.
///
/// `bytes` is realigned so the preamble starts at bit 0 of byte 0, even when
/// the buffer began part way through a byte on the wire. A trailing partial
/// byte is zero-filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBuffer {
    /// Position in the buffer sequence, starting at 0.
    pub index: u64,

    /// Absolute stream offset of the byte holding the first preamble bit.
    pub stream_offset: u64,

    /// Bit within that byte where the preamble starts (0 = MSB).
    pub bit_offset: u8,

    /// Transform variant the preamble matched.
    pub mode: TransformMode,

    /// Realigned buffer bytes, preamble included.
    pub bytes: Vec<u8>,

    /// Buffer length in bits.
    pub bit_len: u64,

    /// Conditions observed during synchronization.
    pub flags: BufferFlags,
}

/// A buffer after header and payload decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBuffer {
    pub index: u64,
    pub stream_offset: u64,
    pub bit_offset: u8,
    pub mode: TransformMode,
    pub bit_len: u64,

    /// Header fields, withheld when the header was malformed.
    pub header: Option<HeaderFields>,

    /// Decoded payload samples in arrival order.
    pub samples: Vec<u32>,

    /// Zero bytes appended to complete the last payload word.
    pub payload_padding: usize,

    pub flags: BufferFlags,
}

impl DecodedBuffer {
    /// Header frame number, if the header decoded.
    pub fn frame_num(&self) -> Option<u32> {
        self.header.map(|h| h.frame_num)
    }

    /// Diagnostic view of this buffer without its samples.
    pub fn report(&self) -> BufferReport {
        BufferReport {
            index: self.index,
            stream_offset: self.stream_offset,
            bit_offset: self.bit_offset,
            mode: self.mode,
            bit_len: self.bit_len,
            header: self.header,
            sample_count: self.samples.len(),
            payload_padding: self.payload_padding,
            flags: self.flags,
            flag_names: self.flags.names(),
        }
    }
}

/// Per-buffer diagnostics for external logging or plotting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferReport {
    pub index: u64,
    pub stream_offset: u64,
    pub bit_offset: u8,
    pub mode: TransformMode,
    pub bit_len: u64,
    pub header: Option<HeaderFields>,
    pub sample_count: usize,
    pub payload_padding: usize,
    pub flags: BufferFlags,
    pub flag_names: Vec<&'static str>,
}

/// One item of pipeline output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A decoded buffer, in stream order.
    Buffer(DecodedBuffer),
    /// A completed frame, in sample arrival order.
    Frame(Frame),
    /// A recoverable condition.
    Diagnostic(DiagnosticEvent),
}

impl CaptureEvent {
    /// The frame carried by this event, if any.
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            CaptureEvent::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_diagnostic(&self) -> Option<&DiagnosticEvent> {
        match self {
            CaptureEvent::Diagnostic(event) => Some(event),
            _ => None,
        }
    }
}
