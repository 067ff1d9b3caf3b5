//! Capture stream reading and buffer decoding.
//!
//! - [`StreamSynchronizer`] turns a byte stream into preamble-delimited
//!   [`RawBuffer`](crate::RawBuffer)s
//! - [`BufferDecoder`] splits each buffer and decodes its header and payload
//! - [`format`] holds the on-wire layout constants and field decoders

pub mod decode;
pub mod format;
pub mod reader;

pub use decode::{BufferDecoder, DecodeOutcome};
pub use format::{
    DEFAULT_PREAMBLE, DecodedPayload, HEADER_BYTES, HeaderDecoder, HeaderScaling, PayloadDecoder,
    SampleExtraction, WordSize,
};
pub use reader::StreamSynchronizer;
