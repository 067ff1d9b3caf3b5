//! Buffer providers

pub mod capture;

pub use capture::CaptureProvider;
