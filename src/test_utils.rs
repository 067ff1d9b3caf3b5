//! Synthetic capture builder for tests and benches
//!
//! Produces byte streams the way the device writes them: every buffer is a
//! preamble followed by header words and payload words, all encoded with one
//! transform mode. Sequence buffers carry consecutive sample values, so frame
//! `f` of a clean capture holds the values `f * pixels .. (f + 1) * pixels`.

#![cfg(any(test, feature = "benchmark"))]

use std::path::{Path, PathBuf};

use crate::bits::{PREAMBLE_LEN, encode_word, shift_right};
use crate::capture::format::{HEADER_BYTES, WordSize};
use crate::{
    DecoderConfig, FrameShape, HEADER_FIELD_COUNT, HeaderFields, MAX_BUFFER_COUNT, TransformMode,
};

/// Filler that contains no preamble variant at any alignment.
pub const JUNK_BYTE: u8 = 0xAA;

/// Small-buffer configuration: 40 samples per buffer, 256-byte chunks.
pub fn test_config(frame: FrameShape) -> DecoderConfig {
    let mut config = DecoderConfig::new(frame);
    config.buffer_size = PREAMBLE_LEN + HEADER_BYTES + 40 * 4;
    config.chunk_size = 256;
    config
}

/// Install a test subscriber once; repeated calls are ignored.
#[cfg(test)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("streamdaq=debug")
        .try_init();
}

#[derive(Debug, Clone)]
struct Record {
    header: Option<HeaderFields>,
    samples: Vec<u32>,
}

/// Builder for synthetic captures.
#[derive(Debug, Clone)]
pub struct SyntheticCapture {
    preamble: u32,
    mode: TransformMode,
    header_len: usize,
    word_size: WordSize,
    samples_per_buffer: usize,
    pixels: usize,
    next_seq: u64,
    bytes: Vec<u8>,
    offsets: Vec<u64>,
    records: Vec<Record>,
}

impl SyntheticCapture {
    /// Start an empty capture laid out per `config`, encoded bits-then-bytes.
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            preamble: config.preamble,
            mode: TransformMode::BitsThenBytes,
            header_len: config.header_len,
            word_size: config.word_size,
            samples_per_buffer: config.payload_len() / config.word_size.bytes(),
            pixels: config.frame.pixels(),
            next_seq: 0,
            bytes: Vec::new(),
            offsets: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Encode subsequent buffers with `mode`.
    pub fn mode(mut self, mode: TransformMode) -> Self {
        self.mode = mode;
        self
    }

    /// Append `len` bytes of filler.
    pub fn junk(mut self, len: usize) -> Self {
        self.bytes.resize(self.bytes.len() + len, JUNK_BYTE);
        self
    }

    /// Append `count` full-size buffers continuing the sample sequence.
    pub fn buffers(mut self, count: usize) -> Self {
        for _ in 0..count {
            let (header, samples) = self.next_sequence_buffer();
            self.push_buffer(Some(header), &samples, 0);
        }
        self
    }

    /// Append one sequence buffer followed by `extra` zero bytes of payload.
    pub fn padded_buffer(mut self, extra: usize) -> Self {
        let (header, samples) = self.next_sequence_buffer();
        self.push_buffer(Some(header), &samples, extra);
        if let Some(record) = self.records.last_mut() {
            record.samples.extend(std::iter::repeat_n(0, extra.div_ceil(self.word_size.bytes())));
        }
        self
    }

    /// Append a buffer of `total_len` bytes: a preamble and zeroed header bytes.
    pub fn truncated_buffer(mut self, total_len: usize) -> Self {
        self.offsets.push(self.bytes.len() as u64);
        self.push_word(self.preamble, WordSize::Four);
        self.bytes.resize(self.bytes.len() + total_len.saturating_sub(PREAMBLE_LEN), 0);
        self.records.push(Record { header: None, samples: Vec::new() });
        self
    }

    /// Append a buffer with an explicit header and payload.
    pub fn buffer_with(mut self, header: HeaderFields, samples: &[u32]) -> Self {
        self.push_buffer(Some(header), samples, 0);
        self
    }

    /// Append one buffer per frame number, each carrying a full frame.
    pub fn frames_numbered(mut self, frame_nums: &[u32]) -> Self {
        for (i, &frame_num) in frame_nums.iter().enumerate() {
            let base = (i * self.pixels) as u32;
            let samples: Vec<u32> = (0..self.pixels as u32).map(|s| base + s).collect();
            let header =
                HeaderFields { frame_num, pixel_count: self.pixels as u32, ..Default::default() };
            self.push_buffer(Some(header), &samples, 0);
        }
        self
    }

    /// Delay the whole stream by `bits` (0..=7), filling with `lead`.
    ///
    /// Apply last: buffer offsets keep their byte positions and gain a bit offset.
    pub fn shifted(mut self, bits: u8, lead: u8) -> Self {
        self.bytes = shift_right(&self.bytes, bits, lead);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Stream offset of every buffer's preamble.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn buffer_count(&self) -> usize {
        self.records.len()
    }

    /// Header written into buffer `index`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer has no header.
    pub fn header_for(&self, index: u64) -> HeaderFields {
        self.records[index as usize].header.expect("buffer was written without a header")
    }

    /// Samples written into buffer `index`, including zero padding samples.
    pub fn samples_for(&self, index: u64) -> Vec<u32> {
        self.records[index as usize].samples.clone()
    }

    /// Every sample written, in stream order.
    pub fn all_samples(&self) -> Vec<u32> {
        self.records.iter().flat_map(|r| r.samples.iter().copied()).collect()
    }

    /// Write the capture to a fresh file under the system temp directory.
    pub fn write_temp(&self, name: &str) -> std::io::Result<PathBuf> {
        let dir = std::env::temp_dir().join(format!("streamdaq-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(name);
        self.write_to(&path)?;
        Ok(path)
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }

    fn next_sequence_buffer(&mut self) -> (HeaderFields, Vec<u32>) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let start = seq as usize * self.samples_per_buffer;
        let mask = self.value_mask();
        let samples: Vec<u32> =
            (start..start + self.samples_per_buffer).map(|s| s as u32 & mask).collect();

        let position_in_frame = start % self.pixels;
        let header = HeaderFields {
            linked_list: (seq % 8) as u32,
            frame_num: (start / self.pixels) as u32,
            buffer_count: ((position_in_frame / self.samples_per_buffer.max(1)) as u32)
                % (MAX_BUFFER_COUNT + 1),
            frame_buffer_count: seq as u32,
            write_buffer_count: seq as u32,
            dropped_buffer_count: 0,
            timestamp: (seq * 1000) as u32,
            write_timestamp: (seq * 1000 + 7) as u32,
            pixel_count: self.samples_per_buffer as u32,
            battery_voltage_raw: 3700,
            input_voltage_raw: 5000,
            unix_time: 1_700_000_000 + seq as u32,
        };
        (header, samples)
    }

    fn value_mask(&self) -> u32 {
        match self.word_size {
            WordSize::One => 0xFF,
            WordSize::Two => 0xFFFF,
            WordSize::Four => u32::MAX,
        }
    }

    fn push_buffer(&mut self, header: Option<HeaderFields>, samples: &[u32], extra: usize) {
        self.offsets.push(self.bytes.len() as u64);
        self.push_word(self.preamble, WordSize::Four);

        let words: [u32; HEADER_FIELD_COUNT] = header.unwrap_or_default().to_words();
        for word in words {
            self.push_word(word, WordSize::Four);
        }
        self.bytes.resize(self.bytes.len() + self.header_len - HEADER_BYTES, 0);

        let mask = self.value_mask();
        for &sample in samples {
            self.push_word(sample & mask, self.word_size);
        }
        self.bytes.resize(self.bytes.len() + extra, 0);

        self.records.push(Record {
            header,
            samples: samples.iter().map(|&s| s & mask).collect(),
        });
    }

    fn push_word(&mut self, value: u32, width: WordSize) {
        match width {
            WordSize::One => self.bytes.extend(encode_word::<1>(value, self.mode)),
            WordSize::Two => self.bytes.extend(encode_word::<2>(value, self.mode)),
            WordSize::Four => self.bytes.extend(encode_word::<4>(value, self.mode)),
        }
    }
}
