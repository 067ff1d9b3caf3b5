//! Synchronous capture pipeline
//!
//! Chains [`StreamSynchronizer`] → [`BufferDecoder`] → [`FrameStage`] into one
//! lazy iterator. Nothing is read until the first call to `next`, and
//! dropping the iterator (or reaching `max_frames`) stops reading without
//! draining the rest of the input.
//!
//! ```rust,no_run
//! use streamdaq::{CapturePipeline, DecoderConfig, FrameShape};
//!
//! fn main() -> streamdaq::Result<()> {
//!     let config = DecoderConfig::new(FrameShape::new(200, 200)?);
//!     for frame in CapturePipeline::open("capture.bin", config)?.frames() {
//!         let frame = frame?;
//!         println!("frame {} (header {:?})", frame.index, frame.frame_num);
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::VecDeque;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

use crate::assembly::FrameStage;
use crate::capture::{BufferDecoder, StreamSynchronizer};
use crate::{CaptureEvent, DecoderConfig, Frame, Result};

/// Lazy iterator of [`CaptureEvent`]s over a whole capture.
pub struct CapturePipeline<R> {
    sync: Option<StreamSynchronizer<R>>,
    decoder: BufferDecoder,
    stage: FrameStage,
    out: VecDeque<CaptureEvent>,
    bytes_read: u64,
}

impl CapturePipeline<File> {
    pub fn open<P: AsRef<Path>>(path: P, config: DecoderConfig) -> Result<Self> {
        let sync = StreamSynchronizer::open(path, &config)?;
        Self::with_synchronizer(sync, &config)
    }
}

impl CapturePipeline<Cursor<Vec<u8>>> {
    pub fn from_bytes(data: Vec<u8>, config: DecoderConfig) -> Result<Self> {
        let sync = StreamSynchronizer::from_bytes(data, &config)?;
        Self::with_synchronizer(sync, &config)
    }
}

impl<R: Read> CapturePipeline<R> {
    pub fn new(reader: R, config: DecoderConfig) -> Result<Self> {
        let sync = StreamSynchronizer::new(reader, &config)?;
        Self::with_synchronizer(sync, &config)
    }

    fn with_synchronizer(sync: StreamSynchronizer<R>, config: &DecoderConfig) -> Result<Self> {
        Ok(Self {
            sync: Some(sync),
            decoder: BufferDecoder::new(config),
            stage: FrameStage::from_config(config)?,
            out: VecDeque::new(),
            bytes_read: 0,
        })
    }

    /// Only the frames, in order.
    pub fn frames(self) -> impl Iterator<Item = Result<Frame>> {
        self.filter_map(|event| match event {
            Ok(CaptureEvent::Frame(frame)) => Some(Ok(frame)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
    }

    /// Bytes consumed from the input so far.
    pub fn bytes_read(&self) -> u64 {
        self.sync.as_ref().map_or(self.bytes_read, StreamSynchronizer::bytes_read)
    }

    pub fn frames_emitted(&self) -> u64 {
        self.stage.frames_emitted()
    }

    fn release(&mut self) {
        if let Some(sync) = self.sync.take() {
            self.bytes_read = sync.bytes_read();
            debug!("Releasing capture input after {} bytes", self.bytes_read);
        }
    }

    fn drain_sync_events(&mut self) {
        if let Some(sync) = self.sync.as_mut() {
            self.out.extend(sync.drain_events().into_iter().map(CaptureEvent::Diagnostic));
        }
    }
}

impl<R: Read> Iterator for CapturePipeline<R> {
    type Item = Result<CaptureEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.out.pop_front() {
                return Some(Ok(event));
            }
            if self.stage.is_done() {
                self.release();
                return None;
            }
            let sync = self.sync.as_mut()?;

            match sync.next() {
                Some(Ok(raw)) => {
                    self.drain_sync_events();
                    let outcome = self.decoder.decode(raw);
                    self.out.extend(outcome.events.into_iter().map(CaptureEvent::Diagnostic));
                    self.stage.on_buffer(outcome.buffer, &mut self.out);
                }
                Some(Err(e)) => {
                    self.release();
                    return Some(Err(e));
                }
                None => {
                    self.drain_sync_events();
                    self.stage.on_end(&mut self.out);
                    self.release();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{SyntheticCapture, init_tracing, test_config};
    use crate::{DecodeError, DiagnosticEvent, FrameShape};

    #[test]
    fn clean_capture_reassembles_sequence() {
        init_tracing();
        let config = test_config(FrameShape { width: 10, height: 10 });
        // 8 buffers * 40 samples = 320 samples = 3 frames + 20
        let capture = SyntheticCapture::new(&config).junk(11).buffers(8);
        let frames: Vec<Frame> = CapturePipeline::from_bytes(capture.bytes().to_vec(), config)
            .unwrap()
            .frames()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(frames.len(), 4);
        for (i, frame) in frames.iter().take(3).enumerate() {
            let start = i * 100;
            assert_eq!(frame.samples, (start as u32..start as u32 + 100).collect::<Vec<_>>());
            // tagged by the buffer holding the frame's first sample
            let first_buffer = (start / 40) as u64;
            assert_eq!(frame.frame_num, Some(capture.header_for(first_buffer).frame_num));
            assert!(!frame.is_partial());
        }
        assert_eq!(frames[3].padded, 80);
    }

    #[test]
    fn max_frames_stops_early() {
        let mut config = test_config(FrameShape { width: 10, height: 10 });
        config.max_frames = Some(1);
        let capture = SyntheticCapture::new(&config).buffers(20);
        let mut pipeline = CapturePipeline::from_bytes(capture.into_bytes(), config).unwrap();
        let frames = pipeline.by_ref().filter(|e| matches!(e, Ok(CaptureEvent::Frame(_)))).count();

        assert_eq!(frames, 1);
        assert_eq!(pipeline.frames_emitted(), 1);
        assert!(pipeline.next().is_none());
    }

    #[test]
    fn diagnostics_surface_in_stream() {
        let config = test_config(FrameShape { width: 10, height: 10 });
        let capture = SyntheticCapture::new(&config).buffers(2).truncated_buffer(20).buffers(2);
        let events: Vec<CaptureEvent> = CapturePipeline::from_bytes(capture.into_bytes(), config)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        let diagnostics: Vec<&DiagnosticEvent> =
            events.iter().filter_map(CaptureEvent::as_diagnostic).collect();
        assert!(diagnostics.iter().any(|d| {
            matches!(d, DiagnosticEvent::DesynchronizedBuffer { buffer_index: 2, .. })
        }));
        assert!(
            diagnostics
                .iter()
                .any(|d| matches!(d, DiagnosticEvent::MalformedHeader { buffer_index: 2, .. }))
        );
        let buffers = events.iter().filter(|e| matches!(e, CaptureEvent::Buffer(_))).count();
        assert_eq!(buffers, 5);

        // buffers 1 and 2 complete in the same chunk; the diagnostic sits between them
        let position = |pred: &dyn Fn(&CaptureEvent) -> bool| events.iter().position(pred).unwrap();
        let desync = position(&|e| {
            matches!(
                e,
                CaptureEvent::Diagnostic(DiagnosticEvent::DesynchronizedBuffer {
                    buffer_index: 2,
                    ..
                })
            )
        });
        assert!(position(&|e| matches!(e, CaptureEvent::Buffer(b) if b.index == 1)) < desync);
        assert!(desync < position(&|e| matches!(e, CaptureEvent::Buffer(b) if b.index == 2)));
    }

    #[test]
    fn empty_input_reports_no_preamble() {
        let config = test_config(FrameShape { width: 10, height: 10 });
        let events: Vec<CaptureEvent> = CapturePipeline::from_bytes(Vec::new(), config)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            events,
            vec![CaptureEvent::Diagnostic(DiagnosticEvent::NoPreambleFound { bytes_scanned: 0 })]
        );
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = test_config(FrameShape { width: 10, height: 10 });
        config.modes.clear();
        assert!(matches!(
            CapturePipeline::from_bytes(Vec::new(), config),
            Err(DecodeError::Config { .. })
        ));
    }
}
