//! Glue between decoded buffers and frames

use std::collections::VecDeque;
use tracing::{debug, info};

use super::{FrameAssembler, FrameNumberTracker};
use crate::{
    BufferFlags, CaptureEvent, DecodedBuffer, DecoderConfig, DiagnosticEvent, FrameShape, Result,
};

/// Feeds decoded buffers through the frame number tracker and assembler.
///
/// Events come out in stream order: a buffer's diagnostics, then the buffer,
/// then any frames it completed. Once `max_frames` frames are out the stage
/// is done and ignores further input.
#[derive(Debug, Clone)]
pub struct FrameStage {
    assembler: FrameAssembler,
    tracker: FrameNumberTracker,
    max_frames: Option<usize>,
    buffers_seen: u64,
    frames_out: u64,
    done: bool,
}

impl FrameStage {
    pub fn new(shape: FrameShape, max_frames: Option<usize>) -> Result<Self> {
        Ok(Self {
            assembler: FrameAssembler::new(shape)?,
            tracker: FrameNumberTracker::new(),
            max_frames,
            buffers_seen: 0,
            frames_out: 0,
            done: false,
        })
    }

    pub fn from_config(config: &DecoderConfig) -> Result<Self> {
        Self::new(config.frame, config.max_frames)
    }

    /// Whether the frame limit has been reached or the input has ended.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_out
    }

    pub fn buffers_seen(&self) -> u64 {
        self.buffers_seen
    }

    pub fn on_buffer(&mut self, mut buffer: DecodedBuffer, out: &mut VecDeque<CaptureEvent>) {
        if self.done {
            return;
        }
        self.buffers_seen += 1;

        if let Some(frame_num) = buffer.frame_num() {
            if let Some(event) = self.tracker.observe(buffer.index, frame_num) {
                match event {
                    DiagnosticEvent::FrameNumberRegression { .. } => {
                        buffer.flags.insert(BufferFlags::FRAME_NUMBER_REGRESSION)
                    }
                    _ => buffer.flags.insert(BufferFlags::FRAME_NUMBER_GAP),
                }
                out.push_back(CaptureEvent::Diagnostic(event));
            }
        }

        let frames = self.assembler.push_samples(&buffer.samples, buffer.frame_num());
        out.push_back(CaptureEvent::Buffer(buffer));
        for frame in frames {
            if self.limit_reached() {
                break;
            }
            out.push_back(CaptureEvent::Frame(frame));
            self.frames_out += 1;
        }
        if self.limit_reached() {
            debug!("Frame limit of {:?} reached", self.max_frames);
            self.done = true;
        }
    }

    /// Flush the partial frame, if any, at end of input.
    pub fn on_end(&mut self, out: &mut VecDeque<CaptureEvent>) {
        if self.done {
            return;
        }
        self.done = true;
        if let Some(frame) = self.assembler.finish() {
            out.push_back(CaptureEvent::Diagnostic(DiagnosticEvent::PartialFrame {
                frame_index: frame.index,
                padded: frame.padded,
            }));
            out.push_back(CaptureEvent::Frame(frame));
            self.frames_out += 1;
        }
        info!("Assembly finished: {} buffers, {} frames", self.buffers_seen, self.frames_out);
    }

    fn limit_reached(&self) -> bool {
        self.max_frames.is_some_and(|max| self.frames_out >= max as u64)
    }
}
