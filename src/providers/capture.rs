//! Capture provider over any blocking reader

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info, trace};

use crate::capture::StreamSynchronizer;
use crate::provider::Provider;
use crate::{DecodeError, DecoderConfig, DiagnosticEvent, RawBuffer, Result};

/// Provider that synchronizes a capture on the blocking thread pool
///
/// Reads and preamble scanning are blocking work, so each step moves the
/// synchronizer onto `spawn_blocking` and takes it back when the step is done.
pub struct CaptureProvider<R> {
    /// Synchronizer, absent only while a step is running
    sync: Option<StreamSynchronizer<R>>,

    /// Set once the synchronizer returned `None` or an error
    finished: bool,

    /// Bytes read as of the last completed step
    bytes_read: u64,
}

impl CaptureProvider<File> {
    /// Open a capture file
    pub fn open<P: AsRef<Path>>(path: P, config: &DecoderConfig) -> Result<Self> {
        let sync = StreamSynchronizer::open(path, config)?;
        Ok(Self::from_synchronizer(sync))
    }
}

impl CaptureProvider<Cursor<Vec<u8>>> {
    /// Provide buffers from an in-memory capture
    pub fn from_bytes(data: Vec<u8>, config: &DecoderConfig) -> Result<Self> {
        info!("In-memory capture: {} bytes", data.len());
        let sync = StreamSynchronizer::from_bytes(data, config)?;
        Ok(Self::from_synchronizer(sync))
    }
}

impl<R: Read + Send + 'static> CaptureProvider<R> {
    pub fn new(reader: R, config: &DecoderConfig) -> Result<Self> {
        Ok(Self::from_synchronizer(StreamSynchronizer::new(reader, config)?))
    }

    pub fn from_synchronizer(sync: StreamSynchronizer<R>) -> Self {
        Self { sync: Some(sync), finished: false, bytes_read: 0 }
    }

    /// Whether the input has been exhausted
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[async_trait::async_trait]
impl<R: Read + Send + 'static> Provider for CaptureProvider<R> {
    async fn next_buffer(&mut self) -> Result<Option<RawBuffer>> {
        if self.finished {
            return Ok(None);
        }
        let Some(mut sync) = self.sync.take() else {
            return Err(DecodeError::Worker {
                context: "synchronizer lost by an interrupted read".to_string(),
                source: None,
            });
        };

        let (sync, item) = tokio::task::spawn_blocking(move || {
            let item = sync.next();
            (sync, item)
        })
        .await?;

        self.bytes_read = sync.bytes_read();
        self.sync = Some(sync);

        match item {
            Some(Ok(buffer)) => {
                trace!("Provided buffer {} ({} bits)", buffer.index, buffer.bit_len);
                Ok(Some(buffer))
            }
            Some(Err(e)) => {
                self.finished = true;
                Err(e)
            }
            None => {
                debug!("Capture exhausted after {} bytes", self.bytes_read);
                self.finished = true;
                Ok(None)
            }
        }
    }

    fn drain_events(&mut self) -> Vec<DiagnosticEvent> {
        self.sync.as_mut().map(StreamSynchronizer::drain_events).unwrap_or_default()
    }

    fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}
