//! Buffer wire format and field decoding
//!
//! ## Buffer Structure
//!
//! 1. **Preamble** (4 bytes) - sync pattern under one of four transforms
//! 2. **Header** (48 bytes by default) - twelve 32-bit metadata words
//! 3. **Payload** - packed sample words up to the next preamble
//!
//! Header and payload words use the same transform as the preamble that
//! opened the buffer. Each word is decoded through
//! [`decode_word`](crate::bits::decode_word) with its width fixed at compile
//! time, so no byte slice is ever reinterpreted as a differently shaped array.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::bits::decode_word;
use crate::{DecodeError, HEADER_FIELD_COUNT, HeaderFields, Result, TransformMode};

/// Logical sync pattern emitted by the device.
pub const DEFAULT_PREAMBLE: u32 = 0x1234_5678;

/// Bytes occupied by the twelve header words.
pub const HEADER_BYTES: usize = HEADER_FIELD_COUNT * 4;

/// Payload word width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordSize {
    One,
    Two,
    #[default]
    Four,
}

impl WordSize {
    /// Width in bytes.
    pub fn bytes(self) -> usize {
        match self {
            WordSize::One => 1,
            WordSize::Two => 2,
            WordSize::Four => 4,
        }
    }
}

/// How sample values are taken from decoded payload words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleExtraction {
    /// One sample per word, the whole decoded value.
    #[default]
    FullWord,
    /// One sample per word, its least significant byte.
    LowByte,
    /// One sample per decoded byte, least significant byte of each word first.
    EachByte,
}

/// Post-processing applied to every decoded header word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderScaling {
    /// Use the decoded integer as is.
    #[default]
    Raw,
    /// Divide every decoded integer by two, as one historical decode path did.
    Halved,
}

impl HeaderScaling {
    fn apply(self, word: u32) -> u32 {
        match self {
            HeaderScaling::Raw => word,
            HeaderScaling::Halved => word / 2,
        }
    }
}

/// Decodes the twelve fixed header fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDecoder {
    scaling: HeaderScaling,
}

impl HeaderDecoder {
    pub fn new(scaling: HeaderScaling) -> Self {
        Self { scaling }
    }

    pub fn scaling(&self) -> HeaderScaling {
        self.scaling
    }

    /// Decode header fields from bytes following the preamble.
    ///
    /// Only the first [`HEADER_BYTES`] are read; longer slices are accepted.
    pub fn decode(&self, header: &[u8], mode: TransformMode) -> Result<HeaderFields> {
        if header.len() < HEADER_BYTES {
            return Err(DecodeError::malformed_header(HEADER_BYTES, header.len()));
        }

        let mut words = [0u32; HEADER_FIELD_COUNT];
        for (word, chunk) in words.iter_mut().zip(header[..HEADER_BYTES].chunks_exact(4)) {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(chunk);
            *word = self.scaling.apply(decode_word(bytes, mode));
        }
        Ok(HeaderFields::from_words(words))
    }
}

/// Samples decoded from one payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedPayload {
    pub samples: Vec<u32>,

    /// Zero bytes appended to complete the last word.
    pub padding: usize,
}

/// Decodes payload bytes into sample values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadDecoder {
    word_size: WordSize,
    extraction: SampleExtraction,
}

impl PayloadDecoder {
    pub fn new(word_size: WordSize, extraction: SampleExtraction) -> Self {
        Self { word_size, extraction }
    }

    pub fn word_size(&self) -> WordSize {
        self.word_size
    }

    pub fn extraction(&self) -> SampleExtraction {
        self.extraction
    }

    /// Decode a payload, zero-padding it to a whole number of words.
    pub fn decode(&self, payload: &[u8], mode: TransformMode) -> DecodedPayload {
        let width = self.word_size.bytes();
        let padding = (width - payload.len() % width) % width;

        let samples = match self.word_size {
            WordSize::One => self.decode_words::<1>(payload, padding, mode),
            WordSize::Two => self.decode_words::<2>(payload, padding, mode),
            WordSize::Four => self.decode_words::<4>(payload, padding, mode),
        };

        if padding > 0 {
            trace!(padding, payload_len = payload.len(), "payload padded to word boundary");
        }
        DecodedPayload { samples, padding }
    }

    fn decode_words<const N: usize>(
        &self,
        payload: &[u8],
        padding: usize,
        mode: TransformMode,
    ) -> Vec<u32> {
        let per_word = match self.extraction {
            SampleExtraction::FullWord | SampleExtraction::LowByte => 1,
            SampleExtraction::EachByte => N,
        };
        let words = (payload.len() + padding) / N;
        let mut samples = Vec::with_capacity(words * per_word);

        let chunks = payload.chunks_exact(N);
        let tail = chunks.remainder();
        let mut push = |word: [u8; N]| {
            let value = decode_word(word, mode);
            match self.extraction {
                SampleExtraction::FullWord => samples.push(value),
                SampleExtraction::LowByte => samples.push(value & 0xFF),
                SampleExtraction::EachByte => {
                    samples.extend(value.to_le_bytes()[..N].iter().map(|&b| b as u32))
                }
            }
        };

        for chunk in chunks {
            let mut word = [0u8; N];
            word.copy_from_slice(chunk);
            push(word);
        }
        if !tail.is_empty() {
            let mut word = [0u8; N];
            word[..tail.len()].copy_from_slice(tail);
            push(word);
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::encode_word;
    use proptest::prelude::*;

    fn encode_header(words: &[u32; HEADER_FIELD_COUNT], mode: TransformMode) -> Vec<u8> {
        words.iter().flat_map(|&w| encode_word::<4>(w, mode)).collect()
    }

    #[test]
    fn header_recovers_known_fields() {
        let words = [0, 18727, 3, 5, 150_001, 2, 123_456, 123_460, 5032, 3300, 5000, 1_700_000_000];
        let bytes = encode_header(&words, TransformMode::BitsThenBytes);
        let header = HeaderDecoder::default().decode(&bytes, TransformMode::BitsThenBytes).unwrap();

        assert_eq!(header.to_words(), words);
        assert_eq!(header.frame_num, 18727);
        assert_eq!(header.buffer_count, 3);
    }

    #[test]
    fn header_matches_documented_algorithm() {
        // Bit-reverse each byte, then read the four bytes little-endian.
        let raw: Vec<u8> = (0u8..48).map(|i| i.wrapping_mul(37)).collect();
        let header = HeaderDecoder::default().decode(&raw, TransformMode::BitsThenBytes).unwrap();
        for (i, word) in header.to_words().iter().enumerate() {
            let chunk = &raw[i * 4..i * 4 + 4];
            let reversed = [
                chunk[0].reverse_bits(),
                chunk[1].reverse_bits(),
                chunk[2].reverse_bits(),
                chunk[3].reverse_bits(),
            ];
            assert_eq!(*word, u32::from_le_bytes(reversed));
        }
    }

    #[test]
    fn halved_scaling_divides_each_field() {
        let words: [u32; HEADER_FIELD_COUNT] = std::array::from_fn(|i| (i as u32 + 1) * 10 + 1);
        let bytes = encode_header(&words, TransformMode::BitsThenBytes);
        let header = HeaderDecoder::new(HeaderScaling::Halved)
            .decode(&bytes, TransformMode::BitsThenBytes)
            .unwrap();
        let expected: Vec<u32> = words.iter().map(|w| w / 2).collect();
        assert_eq!(header.to_words().to_vec(), expected);
    }

    #[test]
    fn short_header_is_malformed() {
        let err = HeaderDecoder::default().decode(&[0u8; 47], TransformMode::Identity).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedHeader { expected: 48, found: 47 }));
    }

    #[test]
    fn longer_header_slices_use_first_48_bytes() {
        let words: [u32; HEADER_FIELD_COUNT] = std::array::from_fn(|i| i as u32);
        let mut bytes = encode_header(&words, TransformMode::Identity);
        bytes.extend_from_slice(&[0xFF; 16]);
        let header = HeaderDecoder::default().decode(&bytes, TransformMode::Identity).unwrap();
        assert_eq!(header.to_words(), words);
    }

    #[test]
    fn payload_pads_to_word_boundary() {
        let decoder = PayloadDecoder::new(WordSize::Four, SampleExtraction::FullWord);
        let mut payload: Vec<u8> = [7u32, 300]
            .iter()
            .flat_map(|&v| encode_word::<4>(v, TransformMode::BitsThenBytes))
            .collect();
        payload.extend_from_slice(&encode_word::<4>(0x0000_0042, TransformMode::Identity)[..2]);

        let decoded = decoder.decode(&payload, TransformMode::BitsThenBytes);
        assert_eq!(decoded.padding, 2);
        assert_eq!(decoded.samples.len(), 3);
        assert_eq!(decoded.samples[..2], [7, 300]);
    }

    #[test]
    fn low_byte_and_each_byte_extraction() {
        let payload = encode_word::<4>(0x0403_0201, TransformMode::BitsThenBytes).to_vec();

        let low = PayloadDecoder::new(WordSize::Four, SampleExtraction::LowByte)
            .decode(&payload, TransformMode::BitsThenBytes);
        assert_eq!(low.samples, vec![0x01]);

        let each = PayloadDecoder::new(WordSize::Four, SampleExtraction::EachByte)
            .decode(&payload, TransformMode::BitsThenBytes);
        assert_eq!(each.samples, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn each_byte_equals_per_byte_bit_reversal() {
        // The uint8 view of a bits-then-bytes payload is each raw byte bit-reversed in place.
        let raw = [0x80u8, 0x40, 0xC0, 0x20, 0xA0, 0x60, 0xE0, 0x10];
        let each = PayloadDecoder::new(WordSize::Four, SampleExtraction::EachByte)
            .decode(&raw, TransformMode::BitsThenBytes);
        assert_eq!(each.samples, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn narrow_words() {
        let decoder = PayloadDecoder::new(WordSize::Two, SampleExtraction::FullWord);
        let payload: Vec<u8> = [0x1234u32, 0xBEEF]
            .iter()
            .flat_map(|&v| encode_word::<2>(v, TransformMode::BytesOnly))
            .collect();
        let decoded = decoder.decode(&payload, TransformMode::BytesOnly);
        assert_eq!(decoded.samples, vec![0x1234, 0xBEEF]);
        assert_eq!(decoded.padding, 0);

        let bytes = PayloadDecoder::new(WordSize::One, SampleExtraction::FullWord)
            .decode(&[0x80, 0x01], TransformMode::BitsOnly);
        assert_eq!(bytes.samples, vec![0x01, 0x80]);
    }

    #[test]
    fn empty_payload() {
        let decoded = PayloadDecoder::default().decode(&[], TransformMode::Identity);
        assert!(decoded.samples.is_empty());
        assert_eq!(decoded.padding, 0);
    }

    proptest! {
        #[test]
        fn header_round_trip_any_mode(
            words in prop::array::uniform12(any::<u32>()),
            index in 0usize..4,
        ) {
            let mode = TransformMode::ALL[index];
            let bytes = encode_header(&words, mode);
            let header = HeaderDecoder::default().decode(&bytes, mode).unwrap();
            prop_assert_eq!(header.to_words(), words);
        }

        #[test]
        fn payload_sample_count_follows_length(len in 0usize..64) {
            let payload = vec![0xA5u8; len];
            let decoded = PayloadDecoder::default().decode(&payload, TransformMode::BitsThenBytes);
            prop_assert_eq!(decoded.samples.len(), len.div_ceil(4));
            prop_assert_eq!((len + decoded.padding) % 4, 0);
        }
    }
}
