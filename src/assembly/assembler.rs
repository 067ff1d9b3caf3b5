//! Sample accumulation into fixed-size frames

use tracing::debug;

use crate::{Frame, FrameShape, Result};

/// Accumulates samples in arrival order and cuts them into frames.
///
/// Buffer payloads do not divide the frame size, so a buffer's samples may
/// complete one frame and start the next. Each frame is tagged with the
/// first header frame number seen among the buffers that contributed to it.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    shape: FrameShape,
    pixels: usize,
    pending: Vec<u32>,
    pending_frame_num: Option<u32>,
    next_index: u64,
}

impl FrameAssembler {
    /// Fails with [`DecodeError::Config`](crate::DecodeError::Config) for a
    /// zero-sized shape.
    pub fn new(shape: FrameShape) -> Result<Self> {
        shape.validate()?;
        let pixels = shape.pixels();
        Ok(Self {
            shape,
            pixels,
            pending: Vec::with_capacity(pixels),
            pending_frame_num: None,
            next_index: 0,
        })
    }

    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    /// Samples waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Frames produced so far.
    pub fn frames_emitted(&self) -> u64 {
        self.next_index
    }

    /// Append one buffer's samples, returning every frame they complete.
    pub fn push_samples(&mut self, samples: &[u32], frame_num: Option<u32>) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut rest = samples;

        while !rest.is_empty() {
            if self.pending_frame_num.is_none() {
                self.pending_frame_num = frame_num;
            }
            let take = (self.pixels - self.pending.len()).min(rest.len());
            let (head, tail) = rest.split_at(take);
            self.pending.extend_from_slice(head);
            rest = tail;

            if self.pending.len() == self.pixels {
                frames.push(self.cut(0));
            }
        }
        frames
    }

    /// Zero-pad and emit the remainder, if any samples are pending.
    pub fn finish(&mut self) -> Option<Frame> {
        if self.pending.is_empty() {
            return None;
        }
        let padded = self.pixels - self.pending.len();
        self.pending.resize(self.pixels, 0);
        debug!("Partial frame {}: {} samples padded", self.next_index, padded);
        Some(self.cut(padded))
    }

    fn cut(&mut self, padded: usize) -> Frame {
        let samples = std::mem::replace(&mut self.pending, Vec::with_capacity(self.pixels));
        let frame = Frame {
            index: self.next_index,
            frame_num: self.pending_frame_num.take(),
            shape: self.shape,
            samples,
            padded,
        };
        self.next_index += 1;
        frame
    }
}

/// Lazy frame iterator over a flat sample sequence.
pub struct Frames<I> {
    samples: I,
    assembler: FrameAssembler,
    done: bool,
}

/// Cut any sample sequence into frames of `shape`.
///
/// The last frame is zero-padded and marked partial when the sequence does
/// not end on a frame boundary.
pub fn assemble<I>(samples: I, shape: FrameShape) -> Result<Frames<I::IntoIter>>
where
    I: IntoIterator<Item = u32>,
{
    Ok(Frames {
        samples: samples.into_iter(),
        assembler: FrameAssembler::new(shape)?,
        done: false,
    })
}

impl<I: Iterator<Item = u32>> Iterator for Frames<I> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.done {
            return None;
        }
        let pixels = self.assembler.pixels;
        let mut chunk = Vec::with_capacity(pixels);
        chunk.extend(self.samples.by_ref().take(pixels));

        if chunk.len() == pixels {
            self.assembler.push_samples(&chunk, None).pop()
        } else {
            self.done = true;
            self.assembler.push_samples(&chunk, None);
            self.assembler.finish()
        }
    }
}
