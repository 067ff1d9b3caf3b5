//! Raw buffer to decoded buffer
//!
//! A buffer is laid out as `preamble | header | payload`. The header and
//! payload are decoded with the transform mode of the preamble that opened
//! the buffer.

use tracing::{trace, warn};

use super::format::{HEADER_BYTES, HeaderDecoder, PayloadDecoder};
use crate::bits::PREAMBLE_LEN;
use crate::{BufferFlags, DecodedBuffer, DecoderConfig, DiagnosticEvent, RawBuffer};

/// A decoded buffer plus the conditions found while decoding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub buffer: DecodedBuffer,
    pub events: Vec<DiagnosticEvent>,
}

/// Splits raw buffers and applies the header and payload decoders.
///
/// Holds only configuration, so clones are cheap and can be moved onto
/// worker threads.
#[derive(Debug, Clone, Copy)]
pub struct BufferDecoder {
    header: HeaderDecoder,
    payload: PayloadDecoder,
    header_len: usize,
}

impl BufferDecoder {
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            header: HeaderDecoder::new(config.header_scaling),
            payload: PayloadDecoder::new(config.word_size, config.sample_extraction),
            header_len: config.header_len,
        }
    }

    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Decode one buffer.
    pub fn decode(&self, raw: RawBuffer) -> DecodeOutcome {
        let RawBuffer { index, stream_offset, bit_offset, mode, bytes, bit_len, mut flags } = raw;
        let mut events = Vec::new();

        let valid = (bit_len.div_ceil(8) as usize).min(bytes.len());
        let body = &bytes[PREAMBLE_LEN.min(valid)..valid];
        let header_end = self.header_len.min(body.len());
        let (header_bytes, payload_bytes) = body.split_at(header_end);

        let header = match self.header.decode(header_bytes, mode) {
            Ok(header) => Some(header),
            Err(_) => {
                warn!(
                    "Buffer {} at {:#x}: header has {} of {} bytes",
                    index,
                    stream_offset,
                    header_bytes.len(),
                    HEADER_BYTES
                );
                flags.insert(BufferFlags::MALFORMED_HEADER);
                events.push(DiagnosticEvent::MalformedHeader {
                    buffer_index: index,
                    expected: HEADER_BYTES,
                    found: header_bytes.len(),
                });
                None
            }
        };

        if let Some(h) = header.filter(|h| !h.buffer_count_in_range()) {
            warn!("Buffer {}: buffer_count {} out of range", index, h.buffer_count);
            flags.insert(BufferFlags::BUFFER_COUNT_OUT_OF_RANGE);
            events.push(DiagnosticEvent::BufferCountOutOfRange {
                buffer_index: index,
                buffer_count: h.buffer_count,
            });
        }

        let payload = self.payload.decode(payload_bytes, mode);
        if payload.padding > 0 {
            flags.insert(BufferFlags::PAYLOAD_PADDED);
        }

        trace!(
            "Decoded buffer {}: frame_num={:?}, samples={}, flags={}",
            index,
            header.map(|h| h.frame_num),
            payload.samples.len(),
            flags
        );

        DecodeOutcome {
            buffer: DecodedBuffer {
                index,
                stream_offset,
                bit_offset,
                mode,
                bit_len,
                header,
                samples: payload.samples,
                payload_padding: payload.padding,
                flags,
            },
            events,
        }
    }
}
