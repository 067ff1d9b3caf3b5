//! Frame reassembly from decoded buffers.
//!
//! [`FrameAssembler`] cuts the sample sequence into `width * height` frames,
//! [`FrameNumberTracker`] cross-checks header frame numbers and
//! [`FrameStage`] combines both into the event sequence the pipelines emit.
//!
//! ```rust
//! use streamdaq::assembly::assemble;
//! use streamdaq::FrameShape;
//!
//! let shape = FrameShape::new(4, 4).unwrap();
//! let frames: Vec<_> = assemble(0..20u32, shape).unwrap().collect();
//! assert_eq!(frames.len(), 2);
//! assert_eq!(frames[1].padded, 12);
//! ```

mod assembler;
mod sequence;
mod stage;

pub use assembler::{FrameAssembler, Frames, assemble};
pub use sequence::FrameNumberTracker;
pub use stage::FrameStage;
