//! Async connection to a capture

use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::info;

use crate::assembly::FrameStage;
use crate::capture::BufferDecoder;
use crate::driver::Driver;
use crate::provider::Provider;
use crate::providers::CaptureProvider;
use crate::stream::{AssembleExt, AssembleFrames};
use crate::{CaptureEvent, DecoderConfig, Frame, Result};

/// Connection to a running decode task
///
/// Decoding starts as soon as the connection is created and applies
/// backpressure through the bounded event channel. Dropping the connection,
/// or any stream taken from it, cancels the task.
pub struct CaptureConnection {
    events: ReceiverStream<Result<CaptureEvent>>,
    stage: FrameStage,
    cancel: CancellationToken,
    guard: DropGuard,
}

impl CaptureConnection {
    /// Open a capture file and start decoding it.
    pub async fn open<P: AsRef<Path>>(path: P, config: DecoderConfig) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening capture: {}", path.display());
        let provider = CaptureProvider::open(path, &config)?;
        Self::from_provider(provider, &config)
    }

    /// Start decoding an in-memory capture.
    pub async fn from_bytes(data: Vec<u8>, config: DecoderConfig) -> Result<Self> {
        let provider = CaptureProvider::from_bytes(data, &config)?;
        Self::from_provider(provider, &config)
    }

    /// Start decoding buffers from any provider.
    pub fn from_provider<P: Provider>(provider: P, config: &DecoderConfig) -> Result<Self> {
        let stage = FrameStage::from_config(config)?;
        let channels = Driver::spawn(
            provider,
            BufferDecoder::new(config),
            config.decode_workers,
            config.channel_capacity,
        );
        info!(
            "Capture connection started ({} workers, {}x{} frames)",
            config.decode_workers, config.frame.width, config.frame.height
        );

        Ok(Self {
            events: ReceiverStream::new(channels.events),
            stage,
            guard: channels.cancel.clone().drop_guard(),
            cancel: channels.cancel,
        })
    }

    /// Token that stops the decode task when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Every event in stream order: diagnostics, decoded buffers and frames.
    pub fn events(self) -> CaptureEvents {
        CaptureEvents { inner: self.events.assemble_frames(self.stage), _guard: self.guard }
    }

    /// Only the frames, in order.
    pub fn frames(self) -> impl Stream<Item = Result<Frame>> + Send + 'static {
        self.events().filter_map(|event| async move {
            match event {
                Ok(CaptureEvent::Frame(frame)) => Some(Ok(frame)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            }
        })
    }
}

pin_project! {
    /// Event stream that cancels its decode task when dropped
    pub struct CaptureEvents {
        #[pin]
        inner: AssembleFrames<ReceiverStream<Result<CaptureEvent>>>,
        _guard: DropGuard,
    }
}

impl CaptureEvents {
    /// The assembly state behind this stream.
    pub fn stage(&self) -> &FrameStage {
        self.inner.stage()
    }
}

impl Stream for CaptureEvents {
    type Item = Result<CaptureEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}
