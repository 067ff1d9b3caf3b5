//! Decoder configuration
//!
//! Every protocol and experiment parameter lives here as a named, validated
//! field. Frame shape has no default: it must come from the capture being
//! decoded.
//!
//! ```rust
//! use streamdaq::{DecoderConfig, FrameShape};
//!
//! let config = DecoderConfig::from_yaml_str(
//!     "frame: { width: 200, height: 200 }\nbuffer_size: 5120\nmax_bit_shift: 1\n",
//! )
//! .unwrap();
//! assert_eq!(config.frame, FrameShape { width: 200, height: 200 });
//! assert_eq!(config.header_len, 48);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::bits::PREAMBLE_LEN;
use crate::capture::format::{
    DEFAULT_PREAMBLE, HEADER_BYTES, HeaderScaling, SampleExtraction, WordSize,
};
use crate::{DecodeError, FrameShape, Result, TransformMode};

fn default_preamble() -> u32 {
    DEFAULT_PREAMBLE
}

fn default_modes() -> Vec<TransformMode> {
    TransformMode::ALL.to_vec()
}

fn default_max_bit_shift() -> u8 {
    1
}

fn default_buffer_size() -> usize {
    10 * 512
}

fn default_header_len() -> usize {
    HEADER_BYTES
}

fn default_chunk_size() -> usize {
    4096
}

fn default_decode_workers() -> usize {
    1
}

fn default_channel_capacity() -> usize {
    64
}

/// Configuration for synchronizing, decoding and assembling a capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecoderConfig {
    /// Logical sync pattern.
    #[serde(default = "default_preamble")]
    pub preamble: u32,

    /// Transform variants to search for, in priority order.
    #[serde(default = "default_modes")]
    pub modes: Vec<TransformMode>,

    /// Largest sub-byte alignment tried, 0..=7.
    #[serde(default = "default_max_bit_shift")]
    pub max_bit_shift: u8,

    /// Expected buffer size in bytes, preamble included.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Header length in bytes following the preamble.
    #[serde(default = "default_header_len")]
    pub header_len: usize,

    /// Allowed deviation from `buffer_size` in bytes before a buffer is flagged.
    #[serde(default)]
    pub buffer_tolerance: usize,

    /// Bytes requested per read.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Payload word width.
    #[serde(default)]
    pub word_size: WordSize,

    /// How samples are taken from decoded payload words.
    #[serde(default)]
    pub sample_extraction: SampleExtraction,

    /// Post-processing of decoded header words.
    #[serde(default)]
    pub header_scaling: HeaderScaling,

    /// Frame dimensions of the capture.
    pub frame: FrameShape,

    /// Buffers decoded concurrently by the async driver.
    #[serde(default = "default_decode_workers")]
    pub decode_workers: usize,

    /// Capacity of the async event channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Stop after this many frames.
    #[serde(default)]
    pub max_frames: Option<usize>,
}

impl DecoderConfig {
    /// Defaults for everything except the frame shape.
    pub fn new(frame: FrameShape) -> Self {
        Self {
            preamble: default_preamble(),
            modes: default_modes(),
            max_bit_shift: default_max_bit_shift(),
            buffer_size: default_buffer_size(),
            header_len: default_header_len(),
            buffer_tolerance: 0,
            chunk_size: default_chunk_size(),
            word_size: WordSize::default(),
            sample_extraction: SampleExtraction::default(),
            header_scaling: HeaderScaling::default(),
            frame,
            decode_workers: default_decode_workers(),
            channel_capacity: default_channel_capacity(),
            max_frames: None,
        }
    }

    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| DecodeError::Parse {
            context: "decoder configuration".to_string(),
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| DecodeError::file_error(path.to_path_buf(), e))?;
        debug!("Loaded decoder configuration from {}", path.display());
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).map_err(|e| DecodeError::Parse {
            context: "decoder configuration".to_string(),
            details: e.to_string(),
        })
    }

    /// Check every field for consistency.
    pub fn validate(&self) -> Result<()> {
        self.frame.validate()?;

        if self.modes.is_empty() {
            return Err(DecodeError::config_error("modes", "at least one mode is required"));
        }
        if self.max_bit_shift > 7 {
            return Err(DecodeError::config_error("max_bit_shift", "must be between 0 and 7"));
        }
        if self.header_len < HEADER_BYTES {
            return Err(DecodeError::config_error(
                "header_len",
                format!("must be at least {} bytes", HEADER_BYTES),
            ));
        }
        if self.buffer_size < PREAMBLE_LEN + self.header_len {
            return Err(DecodeError::config_error(
                "buffer_size",
                format!(
                    "must hold the preamble and header ({} bytes)",
                    PREAMBLE_LEN + self.header_len
                ),
            ));
        }
        if self.chunk_size == 0 {
            return Err(DecodeError::config_error("chunk_size", "must be greater than zero"));
        }
        if self.decode_workers == 0 {
            return Err(DecodeError::config_error("decode_workers", "must be at least 1"));
        }
        if self.channel_capacity == 0 {
            return Err(DecodeError::config_error("channel_capacity", "must be at least 1"));
        }
        if self.max_frames == Some(0) {
            return Err(DecodeError::config_error("max_frames", "must be at least 1 when set"));
        }
        Ok(())
    }

    /// Payload bytes in a buffer of exactly `buffer_size`.
    pub fn payload_len(&self) -> usize {
        self.buffer_size.saturating_sub(PREAMBLE_LEN + self.header_len)
    }

    /// Samples decoded from a buffer of exactly `buffer_size`.
    pub fn samples_per_buffer(&self) -> usize {
        let words = self.payload_len().div_ceil(self.word_size.bytes());
        match self.sample_extraction {
            SampleExtraction::FullWord | SampleExtraction::LowByte => words,
            SampleExtraction::EachByte => words * self.word_size.bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> FrameShape {
        FrameShape { width: 200, height: 200 }
    }

    #[test]
    fn defaults_match_observed_protocol() {
        let config = DecoderConfig::new(shape());
        assert_eq!(config.preamble, 0x1234_5678);
        assert_eq!(config.modes.len(), 4);
        assert_eq!(config.max_bit_shift, 1);
        assert_eq!(config.header_len, 48);
        assert_eq!(config.payload_len(), 5120 - 52);
        assert_eq!(config.samples_per_buffer(), (5120 - 52) / 4);
        config.validate().unwrap();
    }

    #[test]
    fn yaml_round_trip() {
        let mut config = DecoderConfig::new(shape());
        config.sample_extraction = SampleExtraction::LowByte;
        config.header_scaling = HeaderScaling::Halved;
        config.max_frames = Some(3);

        let yaml = config.to_yaml_string().unwrap();
        let back = DecoderConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn yaml_requires_frame_shape() {
        let err = DecoderConfig::from_yaml_str("buffer_size: 5120\n").unwrap_err();
        assert!(matches!(err, DecodeError::Parse { .. }));
    }

    #[test]
    fn yaml_accepts_named_options() {
        let config = DecoderConfig::from_yaml_str(
            "frame: { width: 4, height: 2 }\npreamble: 305419896\nmodes: [bits_then_bytes]\n\
             word_size: two\nsample_extraction: each_byte\nheader_scaling: halved\n",
        )
        .unwrap();
        assert_eq!(config.preamble, 0x1234_5678);
        assert_eq!(config.modes, vec![TransformMode::BitsThenBytes]);
        assert_eq!(config.word_size, WordSize::Two);
        assert_eq!(config.sample_extraction, SampleExtraction::EachByte);
        assert_eq!(config.header_scaling, HeaderScaling::Halved);
    }

    #[test]
    fn yaml_rejects_unknown_fields() {
        assert!(DecoderConfig::from_yaml_str("frame: { width: 4, height: 2 }\nfps: 20\n").is_err());
    }

    #[test]
    fn validation_names_the_field() {
        let mut config = DecoderConfig::new(shape());
        config.chunk_size = 0;
        match config.validate() {
            Err(DecodeError::Config { field, .. }) => assert_eq!(field, "chunk_size"),
            other => panic!("expected config error, got {:?}", other),
        }

        let mut config = DecoderConfig::new(shape());
        config.header_len = 40;
        assert!(config.validate().is_err());

        let mut config = DecoderConfig::new(shape());
        config.buffer_size = 30;
        assert!(config.validate().is_err());

        let config = DecoderConfig::new(FrameShape { width: 0, height: 10 });
        assert!(config.validate().is_err());
    }
}
