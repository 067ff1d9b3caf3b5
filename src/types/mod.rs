//! Core types shared by every pipeline stage.
//!
//! ## Architecture
//!
//! - [`TransformMode`] names the four on-wire serializations of a 32-bit word
//! - [`RawBuffer`] is a preamble-delimited byte range, realigned to bit 0
//! - [`HeaderFields`] holds the twelve fixed metadata fields
//! - [`DecodedBuffer`] pairs the header with decoded payload samples
//! - [`Frame`] is a row-major `width * height` sample grid
//! - [`BufferFlags`] and [`DiagnosticEvent`] carry recoverable conditions
//! - [`CaptureEvent`] is the unit of pipeline output
//!
//! ## Usage Example
//!
//! ```rust
//! use streamdaq::types::{BufferFlags, FrameShape, HeaderFields};
//!
//! let shape = FrameShape::new(200, 200).unwrap();
//! assert_eq!(shape.pixels(), 40_000);
//!
//! let header = HeaderFields { frame_num: 18727, buffer_count: 3, ..Default::default() };
//! assert!(header.buffer_count_in_range());
//!
//! let mut flags = BufferFlags::new();
//! flags.insert(BufferFlags::DESYNCHRONIZED);
//! assert!(flags.has_flag(BufferFlags::DESYNCHRONIZED));
//! ```

mod buffer;
mod diagnostics;
mod flags;
mod frame;
mod header;
mod transform_mode;

pub use buffer::{BufferReport, CaptureEvent, DecodedBuffer, RawBuffer};
pub use diagnostics::DiagnosticEvent;
pub use flags::BufferFlags;
pub use frame::{Frame, FrameShape};
pub use header::{HEADER_FIELD_COUNT, HEADER_FIELD_NAMES, HeaderFields, MAX_BUFFER_COUNT};
pub use transform_mode::TransformMode;
