//! Provider trait for buffer sources

use crate::{DiagnosticEvent, RawBuffer, Result};

/// Trait for raw buffer sources
///
/// Providers hide where buffers come from (a capture file, an in-memory
/// capture, a device) and how reading is scheduled. The driver only needs
/// buffers in stream order plus whatever the source noticed along the way.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Get the next raw buffer
    ///
    /// Returns:
    /// - `Ok(Some(buffer))` - Next buffer in stream order
    /// - `Ok(None)` - Input exhausted (normal termination)
    /// - `Err(e)` - Read failure; the source is finished
    async fn next_buffer(&mut self) -> Result<Option<RawBuffer>>;

    /// Take diagnostic events recorded since the last call
    fn drain_events(&mut self) -> Vec<DiagnosticEvent>;

    /// Bytes consumed from the source so far
    fn bytes_read(&self) -> u64;
}
