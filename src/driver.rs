//! Driver spawns and manages the decode task

use futures::future::{self, BoxFuture};
use futures::stream::FuturesOrdered;
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use super::provider::Provider;
use crate::capture::BufferDecoder;
use crate::{CaptureEvent, Result};

type DecodeFuture = BoxFuture<'static, Result<Vec<CaptureEvent>>>;

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Receiver for decoded buffers and diagnostics, in stream order
    pub events: mpsc::Receiver<Result<CaptureEvent>>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// Driver spawns and manages the decode task
///
/// The task owns the provider and reads raw buffers strictly in order. Each
/// buffer is decoded on the blocking pool as soon as it is read; at most
/// `workers` decodes are in flight and their results are merged back in
/// buffer order before being sent.
pub struct Driver;

impl Driver {
    /// Spawn the decode task for the given provider
    ///
    /// Returns the event receiver plus a cancellation token. The task also
    /// stops when the receiver is dropped.
    pub fn spawn<P>(
        provider: P,
        decoder: BufferDecoder,
        workers: usize,
        capacity: usize,
    ) -> DriverChannels
    where
        P: Provider,
    {
        let (event_tx, event_rx) = mpsc::channel(capacity.max(1));
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        tokio::spawn(async move {
            Self::decode_task(provider, decoder, workers.max(1), event_tx, cancel_task).await;
        });

        DriverChannels { events: event_rx, cancel }
    }

    async fn decode_task<P>(
        mut provider: P,
        decoder: BufferDecoder,
        workers: usize,
        event_tx: mpsc::Sender<Result<CaptureEvent>>,
        cancel: CancellationToken,
    ) where
        P: Provider,
    {
        info!("Decode task started ({} workers)", workers);
        let mut in_flight: FuturesOrdered<DecodeFuture> = FuturesOrdered::new();
        let mut input_done = false;
        let mut buffers = 0u64;

        loop {
            if !input_done && in_flight.len() < workers {
                let result = tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Decode task cancelled during read");
                        break;
                    }
                    result = provider.next_buffer() => result,
                };

                let events = provider.drain_events();
                if !events.is_empty() {
                    let events = events.into_iter().map(CaptureEvent::Diagnostic).collect();
                    in_flight.push_back(future::ready(Ok(events)).boxed());
                }

                match result {
                    Ok(Some(raw)) => {
                        buffers += 1;
                        trace!("Dispatching buffer {} for decode", raw.index);
                        in_flight.push_back(Self::dispatch(decoder, raw));
                    }
                    Ok(None) => {
                        debug!("Provider exhausted after {} bytes", provider.bytes_read());
                        input_done = true;
                    }
                    Err(e) => {
                        error!("Provider error: {}", e);
                        in_flight.push_back(future::ready(Err(e)).boxed());
                        input_done = true;
                    }
                }
                continue;
            }

            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Decode task cancelled");
                    break;
                }
                next = in_flight.next() => next,
            };
            let Some(result) = next else {
                break;
            };

            let (items, fatal) = match result {
                Ok(events) => (events.into_iter().map(Ok).collect::<Vec<_>>(), false),
                Err(e) => (vec![Err(e)], true),
            };
            if !Self::forward(&event_tx, items, &cancel).await {
                debug!("Event receiver dropped, shutting down");
                break;
            }
            if fatal {
                break;
            }
        }

        info!("Decode task ended ({} buffers, {} bytes)", buffers, provider.bytes_read());
    }

    /// Start decoding on the blocking pool immediately.
    fn dispatch(decoder: BufferDecoder, raw: crate::RawBuffer) -> DecodeFuture {
        let handle = tokio::task::spawn_blocking(move || decoder.decode(raw));
        async move {
            let outcome = handle.await?;
            let mut events: Vec<CaptureEvent> =
                outcome.events.into_iter().map(CaptureEvent::Diagnostic).collect();
            events.push(CaptureEvent::Buffer(outcome.buffer));
            Ok(events)
        }
        .boxed()
    }

    /// Send items in order; false once the receiver is gone or the task is cancelled.
    async fn forward(
        event_tx: &mpsc::Sender<Result<CaptureEvent>>,
        items: Vec<Result<CaptureEvent>>,
        cancel: &CancellationToken,
    ) -> bool {
        for item in items {
            let sent = tokio::select! {
                _ = cancel.cancelled() => return false,
                sent = event_tx.send(item) => sent,
            };
            if sent.is_err() {
                return false;
            }
        }
        true
    }
}
