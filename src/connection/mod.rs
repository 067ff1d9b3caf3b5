//! Async connections to captures

pub mod capture;


pub use capture::{CaptureConnection, CaptureEvents};
