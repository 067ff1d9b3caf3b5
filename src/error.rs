//! Error types for capture decoding.
//!
//! Only conditions that stop the pipeline are errors. Everything a corrupted
//! capture can throw at the decoder (desynchronized buffers, short headers,
//! frame number gaps, partial frames) is reported as a
//! [`DiagnosticEvent`](crate::DiagnosticEvent) alongside normal output instead.
//!
//! ## Error Categories
//!
//! - **File Errors**: the capture cannot be opened (fatal)
//! - **I/O Errors**: a read failed part way through the stream
//! - **Configuration Errors**: a [`DecoderConfig`](crate::DecoderConfig) field is invalid
//! - **Parse Errors**: a configuration document could not be parsed
//! - **Header Errors**: header bytes are shorter than the fixed field width
//! - **Worker Errors**: a decode task panicked or was aborted
//!
//! ## Helper Constructors
//!
//! ```rust
//! use streamdaq::DecodeError;
//! use std::path::PathBuf;
//!
//! let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
//! let file_error = DecodeError::file_error(PathBuf::from("/captures/run.bin"), io_err);
//! assert!(file_error.is_fatal());
//!
//! let header_error = DecodeError::malformed_header(48, 12);
//! assert!(!header_error.is_fatal());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for decoding operations.
pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

/// Main error type for decoding operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("Capture file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Read failed during {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration field '{field}': {reason}")]
    Config { field: String, reason: String },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Malformed header: expected at least {expected} bytes, found {found}")]
    MalformedHeader { expected: usize, found: usize },

    #[error("Decode worker failed: {context}")]
    Worker {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DecodeError {
    /// Returns whether this error aborts the whole pipeline.
    pub fn is_fatal(&self) -> bool {
        match self {
            DecodeError::File { .. } => true,
            DecodeError::Io { .. } => true,
            DecodeError::Config { .. } => true,
            DecodeError::Parse { .. } => true,
            DecodeError::Worker { .. } => true,
            DecodeError::MalformedHeader { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            DecodeError::File { .. } => vec![
                "Check the capture file exists and is readable",
                "Check file permissions",
                "Verify the path points at a raw capture, not a directory",
            ],
            DecodeError::Io { .. } => vec![
                "Check the storage device for read errors",
                "Retry with a fresh copy of the capture",
            ],
            DecodeError::Config { .. } => vec![
                "Check the named configuration field",
                "Supply the frame shape of the actual capture",
                "Compare against the documented defaults",
            ],
            DecodeError::Parse { .. } => vec![
                "Check the configuration document is valid YAML",
                "Check field names and value types",
            ],
            DecodeError::MalformedHeader { .. } => vec![
                "Check header_len matches the device firmware",
                "Inspect the buffer flagged as desynchronized",
            ],
            DecodeError::Worker { .. } => vec![
                "Reduce decode_workers",
                "Run the synchronous pipeline to isolate the failing buffer",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        DecodeError::File { path, source }
    }

    /// Helper constructor for mid-stream read failures.
    pub fn io_error(context: impl Into<String>, source: std::io::Error) -> Self {
        DecodeError::Io { context: context.into(), source }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DecodeError::Config { field: field.into(), reason: reason.into() }
    }

    /// Helper constructor for short header slices.
    pub fn malformed_header(expected: usize, found: usize) -> Self {
        DecodeError::MalformedHeader { expected, found }
    }

    /// Helper constructor for decode worker failures.
    pub fn worker_failed(
        context: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        DecodeError::Worker { context: context.into(), source: Some(source) }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::Io { context: "capture stream".to_string(), source: err }
    }
}

impl From<tokio::task::JoinError> for DecodeError {
    fn from(err: tokio::task::JoinError) -> Self {
        let context =
            if err.is_cancelled() { "decode task cancelled" } else { "decode task panicked" };
        DecodeError::worker_failed(context, Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[cfg(test)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn error_messages_carry_their_context(
            reason in ".*",
            field in "\\w+",
            expected in 1usize..4096usize,
            found in 0usize..4096usize,
          ) {
            let config_error = DecodeError::config_error(field.clone(), reason.clone());
            let header_error = DecodeError::malformed_header(expected, found);
            let parse_error =
                DecodeError::Parse { context: field.clone(), details: reason.clone() };

            let config_msg = config_error.to_string();
            prop_assert!(config_msg.contains(&field));
            prop_assert!(config_msg.contains(&reason));

            let header_msg = header_error.to_string();
            prop_assert!(header_msg.contains(&expected.to_string()));
            prop_assert!(header_msg.contains(&found.to_string()));

            prop_assert!(parse_error.to_string().contains(&reason));
          }

          #[test]
          fn io_conversion_keeps_source_message(message in ".*") {
            let io_err = std::io::Error::other(message.clone());
            let converted: DecodeError = io_err.into();
            match converted {
              DecodeError::Io { source, .. } => {
                prop_assert_eq!(source.to_string(), message);
              }
              _ => prop_assert!(false, "Expected Io error from io::Error conversion"),
            }
          }
        }
    }

    #[test]
    fn error_constructors_validation() {
        let file_error = DecodeError::file_error(
            PathBuf::from("/test"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "test"),
        );
        assert!(matches!(file_error, DecodeError::File { .. }));

        let config_error = DecodeError::config_error("chunk_size", "must be positive");
        assert!(matches!(config_error, DecodeError::Config { .. }));

        let header_error = DecodeError::malformed_header(48, 3);
        assert!(matches!(header_error, DecodeError::MalformedHeader { expected: 48, found: 3 }));
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<DecodeError>();

        let error = DecodeError::malformed_header(48, 0);
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn only_open_and_stream_failures_are_fatal() {
        let file_error = DecodeError::file_error(
            PathBuf::from("/missing.bin"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(file_error.is_fatal());
        assert!(!DecodeError::malformed_header(48, 10).is_fatal());

        for suggestion in file_error.recovery_suggestions() {
            assert!(suggestion.len() > 5);
        }
    }

    #[test]
    fn source_chain_is_preserved() {
        let file_error = DecodeError::file_error(
            PathBuf::from("/capture.bin"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let source = std::error::Error::source(&file_error).expect("file error has a source");
        assert_eq!(source.to_string(), "denied");
    }
}
