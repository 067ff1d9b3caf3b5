//! Frame reassembly for raw data-acquisition captures.
//!
//! A capture is a flat byte stream of fixed-size buffers, each opening with a
//! 32-bit preamble that may be bit-reversed, byte-reversed or both, and may
//! start part way through a byte. streamdaq finds those preambles, decodes
//! each buffer's header and payload with the matching transform, and cuts the
//! sample sequence into fixed-size frames.
//!
//! # Features
//!
//! - **Transform-aware sync**: all four serializations of the preamble at any
//!   configured bit alignment
//! - **Streaming**: chunked reads with bounded memory, lazy iterators and streams
//! - **Recoverable diagnostics**: corrupt buffers are flagged, never fatal
//! - **Async decoding**: blocking-pool workers with an order-preserving merge
//!
//! # Quick Start
//!
//! ## Synchronous
//!
//! ```rust,no_run
//! use streamdaq::{DecoderConfig, FrameShape, StreamDaq};
//!
//! fn main() -> streamdaq::Result<()> {
//!     let config = DecoderConfig::new(FrameShape::new(200, 200)?);
//!     for frame in StreamDaq::decode_file("capture.bin", config)?.frames() {
//!         let frame = frame?;
//!         println!("frame {}: {} samples", frame.index, frame.samples.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Async
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use streamdaq::{CaptureEvent, DecoderConfig, StreamDaq};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DecoderConfig::from_yaml_file("capture.yaml")?;
//!     let mut events = StreamDaq::open("capture.bin", config).await?.events();
//!
//!     while let Some(event) = events.next().await {
//!         match event? {
//!             CaptureEvent::Frame(frame) => println!("frame {}", frame.index),
//!             CaptureEvent::Diagnostic(d) => eprintln!("{}", d),
//!             CaptureEvent::Buffer(_) => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod config;
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Decoding stages
pub mod assembly;
pub mod bits;
pub mod capture;
pub mod pipeline;

// Stream-based architecture
pub mod connection;
pub mod driver;
pub mod provider;
pub mod providers;
pub mod stream;

// Core exports
pub use config::DecoderConfig;
pub use error::*;
pub use types::*;

// Main API exports
pub use connection::{CaptureConnection, CaptureEvents};
pub use pipeline::CapturePipeline;

/// Unified entry point for decoding captures.
///
/// # Examples
///
/// ```rust,no_run
/// use streamdaq::{DecoderConfig, FrameShape, StreamDaq};
///
/// #[tokio::main]
/// async fn main() -> streamdaq::Result<()> {
///     let config = DecoderConfig::new(FrameShape::new(200, 200)?);
///     let connection = StreamDaq::open("capture.bin", config).await?;
///     // Use connection...
///     Ok(())
/// }
/// ```
pub struct StreamDaq;

impl StreamDaq {
    /// Open a capture and start decoding it on a background task.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The file does not exist or is not readable
    pub async fn open<P: AsRef<std::path::Path>>(
        path: P,
        config: DecoderConfig,
    ) -> Result<CaptureConnection> {
        CaptureConnection::open(path, config).await
    }

    /// Open a capture for synchronous, lazy decoding.
    ///
    /// # Errors
    ///
    /// Same as [`StreamDaq::open`].
    pub fn decode_file<P: AsRef<std::path::Path>>(
        path: P,
        config: DecoderConfig,
    ) -> Result<CapturePipeline<std::fs::File>> {
        CapturePipeline::open(path, config)
    }

    /// Decode an in-memory capture synchronously.
    pub fn decode_bytes(
        data: Vec<u8>,
        config: DecoderConfig,
    ) -> Result<CapturePipeline<std::io::Cursor<Vec<u8>>>> {
        CapturePipeline::from_bytes(data, config)
    }
}
