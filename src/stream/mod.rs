//! Stream combinators over capture events

pub mod assemble;

pub use assemble::{AssembleExt, AssembleFrames};
