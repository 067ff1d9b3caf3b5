//! Reassembled image frames

use serde::{Deserialize, Serialize};

use crate::{DecodeError, Result};

/// Width and height of a frame in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameShape {
    pub width: usize,
    pub height: usize,
}

impl FrameShape {
    /// Create a frame shape, rejecting zero dimensions.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let shape = Self { width, height };
        shape.validate()?;
        Ok(shape)
    }

    /// Check both dimensions are non-zero and their product fits in `usize`.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(DecodeError::config_error("frame.width", "must be greater than zero"));
        }
        if self.height == 0 {
            return Err(DecodeError::config_error("frame.height", "must be greater than zero"));
        }
        if self.width.checked_mul(self.height).is_none() {
            return Err(DecodeError::config_error("frame", "width * height overflows"));
        }
        Ok(())
    }

    /// Samples per frame.
    pub fn pixels(&self) -> usize {
        self.width * self.height
    }

    /// Per-buffer sample counts needed to fill one frame.
    ///
    /// A frame takes `pixels / samples_per_buffer` full buffers plus one
    /// buffer contributing the remainder, if there is one.
    pub fn buffer_schedule(&self, samples_per_buffer: usize) -> Vec<usize> {
        if samples_per_buffer == 0 {
            return Vec::new();
        }
        let (quotient, remainder) = (
            self.pixels() / samples_per_buffer,
            self.pixels() % samples_per_buffer,
        );
        let mut schedule = vec![samples_per_buffer; quotient];
        if remainder > 0 {
            schedule.push(remainder);
        }
        schedule
    }
}

/// A fixed-size grid of samples, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Position in the emitted frame sequence, starting at 0.
    pub index: u64,

    /// First header frame number among the buffers contributing to this frame.
    pub frame_num: Option<u32>,

    /// Frame dimensions.
    pub shape: FrameShape,

    /// `width * height` samples, row-major.
    pub samples: Vec<u32>,

    /// Trailing samples that were zero-padded at end of stream.
    pub padded: usize,
}

impl Frame {
    pub fn width(&self) -> usize {
        self.shape.width
    }

    pub fn height(&self) -> usize {
        self.shape.height
    }

    /// Whether the frame was completed with zero padding.
    pub fn is_partial(&self) -> bool {
        self.padded > 0
    }

    /// One row of samples.
    pub fn row(&self, y: usize) -> Option<&[u32]> {
        if y >= self.shape.height {
            return None;
        }
        let start = y * self.shape.width;
        self.samples.get(start..start + self.shape.width)
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        (0..self.shape.height).map_while(|y| self.row(y))
    }

    /// Sample at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.shape.width {
            return None;
        }
        self.row(y).map(|row| row[x])
    }

    /// Samples saturated to 8-bit monochrome, row-major.
    pub fn to_gray8(&self) -> Vec<u8> {
        self.samples.iter().map(|&s| s.min(u8::MAX as u32) as u8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_2x3() -> Frame {
        Frame {
            index: 0,
            frame_num: Some(4),
            shape: FrameShape { width: 2, height: 3 },
            samples: vec![1, 2, 3, 4, 5, 300],
            padded: 0,
        }
    }

    #[test]
    fn rows_are_row_major() {
        let frame = frame_2x3();
        let rows: Vec<&[u32]> = frame.rows().collect();
        assert_eq!(rows, vec![&[1, 2][..], &[3, 4][..], &[5, 300][..]]);
        assert_eq!(frame.row(1), Some(&[3, 4][..]));
        assert_eq!(frame.row(3), None);
        assert_eq!(frame.get(1, 2), Some(300));
        assert_eq!(frame.get(2, 0), None);
        assert!(!frame.is_partial());
    }

    #[test]
    fn rows_of_a_degenerate_frame_do_not_panic() {
        let frame = Frame {
            index: 0,
            frame_num: None,
            shape: FrameShape { width: 0, height: 2 },
            samples: Vec::new(),
            padded: 0,
        };
        assert_eq!(frame.rows().count(), 2);
        assert!(frame.rows().all(<[u32]>::is_empty));
    }

    #[test]
    fn gray8_saturates() {
        assert_eq!(frame_2x3().to_gray8(), vec![1, 2, 3, 4, 5, 255]);
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(FrameShape::new(0, 10).is_err());
        assert!(FrameShape::new(10, 0).is_err());
        assert!(FrameShape::new(200, 200).is_ok());
    }

    #[test]
    fn buffer_schedule_matches_capture_layout() {
        // 200x200 frame, 10 blocks of 512 bytes minus a 48-byte header and 40 bytes of framing
        let shape = FrameShape::new(200, 200).unwrap();
        let schedule = shape.buffer_schedule(5032);
        assert_eq!(schedule.len(), 8);
        assert_eq!(schedule[..7], [5032; 7]);
        assert_eq!(schedule[7], 40_000 - 7 * 5032);
        assert_eq!(schedule.iter().sum::<usize>(), shape.pixels());

        assert_eq!(FrameShape::new(10, 10).unwrap().buffer_schedule(25), vec![25; 4]);
        assert!(shape.buffer_schedule(0).is_empty());
    }
}
