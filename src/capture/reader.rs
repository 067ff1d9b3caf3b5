//! Chunked stream synchronizer
//!
//! Reads a capture in fixed-size chunks, carries unconsumed bytes across
//! chunk boundaries and yields one [`RawBuffer`] per pair of consecutive
//! preambles. The bytes after the last preamble are yielded as a final
//! buffer flagged [`BufferFlags::TRAILING`] once the input is exhausted.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use streamdaq::capture::StreamSynchronizer;
//! use streamdaq::{DecoderConfig, FrameShape};
//!
//! fn count_buffers() -> streamdaq::Result<()> {
//!     let config = DecoderConfig::new(FrameShape::new(200, 200)?);
//!     let mut sync = StreamSynchronizer::open("capture.bin", &config)?;
//!     for buffer in sync.by_ref() {
//!         let buffer = buffer?;
//!         println!("buffer {} at {:#x} ({})", buffer.index, buffer.stream_offset, buffer.mode);
//!     }
//!     println!("{} diagnostic events", sync.drain_events().len());
//!     Ok(())
//! }
//! ```
//!
//! ## Memory
//!
//! Before the first preamble, scanned bytes that can no longer start a match
//! are dropped. After it, the carry from the last preamble is capped at
//! `buffer_size + buffer_tolerance + chunk_size` plus one preamble span. When
//! sync is lost and no preamble follows within that range, the bytes up to
//! the scan frontier are yielded as a [`BufferFlags::DESYNCHRONIZED`] buffer
//! and the carry continues from that byte, so no bytes are dropped and the
//! window never exceeds the cap plus one chunk.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{Cursor, ErrorKind, Read};
use std::path::Path;
use tracing::{debug, info, trace, warn};

use crate::bits::{PREAMBLE_BITS, PreambleMatch, PreambleMatcher, extract_bits};
use crate::{BufferFlags, DecodeError, DecoderConfig, DiagnosticEvent, RawBuffer, Result};

/// State carried between chunk reads.
#[derive(Debug, Default)]
struct SyncState {
    /// Unconsumed bytes, starting at the anchor once one is known.
    window: Vec<u8>,
    /// Absolute stream offset of `window[0]`.
    window_start: u64,
    /// Window bytes already tested at every alignment.
    scanned: usize,
    /// Last confirmed preamble, relative to the window.
    anchor: Option<PreambleMatch>,
    /// Confirmed preambles after the anchor, not yet paired.
    pending: Vec<PreambleMatch>,
    /// The anchor marks where an over-long carry was cut, not a preamble.
    anchor_is_cut: bool,
    eof: bool,
}

/// Lazy iterator of preamble-delimited buffers over any reader.
pub struct StreamSynchronizer<R> {
    reader: R,
    matcher: PreambleMatcher,
    chunk_size: usize,
    expected_bits: u64,
    tolerance_bits: u64,
    max_carry: usize,
    state: SyncState,
    /// Yielded buffers with the diagnostic that belongs to each.
    ready: VecDeque<(RawBuffer, Option<DiagnosticEvent>)>,
    events: Vec<DiagnosticEvent>,
    next_index: u64,
    bytes_read: u64,
    skipped_bytes: u64,
    matches_found: u64,
    finished: bool,
}

impl StreamSynchronizer<File> {
    /// Open a capture file.
    ///
    /// Failing to open the file is the only fatal synchronizer error.
    pub fn open<P: AsRef<Path>>(path: P, config: &DecoderConfig) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| DecodeError::file_error(path.to_path_buf(), e))?;
        info!("Opened capture {}", path.display());
        Self::new(file, config)
    }
}

impl StreamSynchronizer<Cursor<Vec<u8>>> {
    /// Synchronize an in-memory capture.
    pub fn from_bytes(data: Vec<u8>, config: &DecoderConfig) -> Result<Self> {
        Self::new(Cursor::new(data), config)
    }
}

impl<R: Read> StreamSynchronizer<R> {
    /// Wrap a reader positioned at the start of a capture.
    pub fn new(reader: R, config: &DecoderConfig) -> Result<Self> {
        config.validate()?;
        let matcher = PreambleMatcher::new(config.preamble, &config.modes, config.max_bit_shift)?;
        let max_carry = config.buffer_size
            + config.buffer_tolerance
            + config.chunk_size
            + matcher.max_span();
        debug!(
            "Synchronizer ready: pattern={:#010x}, variants={}, max_bit_shift={}, chunk_size={}",
            matcher.pattern(),
            matcher.variants().len(),
            matcher.max_bit_shift(),
            config.chunk_size
        );

        Ok(Self {
            reader,
            matcher,
            chunk_size: config.chunk_size,
            expected_bits: config.buffer_size as u64 * 8,
            tolerance_bits: config.buffer_tolerance as u64 * 8,
            max_carry,
            state: SyncState::default(),
            ready: VecDeque::new(),
            events: Vec::new(),
            next_index: 0,
            bytes_read: 0,
            skipped_bytes: 0,
            matches_found: 0,
            finished: false,
        })
    }

    /// Take diagnostic events recorded since the last call.
    ///
    /// Events tied to a buffer are released when that buffer is yielded, so
    /// draining after each `next` puts every diagnostic just ahead of the
    /// buffer it describes.
    pub fn drain_events(&mut self) -> Vec<DiagnosticEvent> {
        std::mem::take(&mut self.events)
    }

    /// Bytes consumed from the reader so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Buffers yielded so far.
    pub fn buffers_yielded(&self) -> u64 {
        self.next_index - self.ready.len() as u64
    }

    /// Leading bytes dropped before the first preamble.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped_bytes
    }

    /// Confirmed preambles so far.
    pub fn preambles_found(&self) -> u64 {
        self.matches_found
    }

    /// Read one chunk, looping over short reads until it is full or EOF.
    fn read_chunk(&mut self) -> Result<usize> {
        let start = self.state.window.len();
        self.state.window.resize(start + self.chunk_size, 0);
        let mut filled = 0;
        while filled < self.chunk_size {
            match self.reader.read(&mut self.state.window[start + filled..]) {
                Ok(0) => {
                    self.state.eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.state.window.truncate(start + filled);
                    return Err(DecodeError::io_error(
                        format!("reading chunk at byte {}", self.bytes_read + filled as u64),
                        e,
                    ));
                }
            }
        }
        self.state.window.truncate(start + filled);
        self.bytes_read += filled as u64;
        Ok(filled)
    }

    /// Test window bytes not yet covered, with enough lookback for matches
    /// that straddle the previous chunk boundary.
    fn scan(&mut self) {
        let lookback = self.matcher.max_span() - 1;
        let from = self.state.scanned.saturating_sub(lookback);
        let found = self.matcher.find_all(&self.state.window[from..]);

        for m in found.into_iter().map(|m| m.offset_by(from)) {
            let accept = match (self.state.pending.last(), self.state.anchor.as_ref()) {
                (Some(prev), _) => m.bit_position() >= prev.bit_position() + PREAMBLE_BITS,
                (None, Some(cut)) if self.state.anchor_is_cut => {
                    m.bit_position() >= cut.bit_position()
                }
                (None, Some(prev)) => m.bit_position() >= prev.bit_position() + PREAMBLE_BITS,
                (None, None) => true,
            };
            if accept {
                trace!(
                    "Preamble at stream byte {} bit {} ({})",
                    self.state.window_start + m.byte_offset as u64,
                    m.bit_offset,
                    m.mode
                );
                self.matches_found += 1;
                if self.state.anchor.is_none() {
                    self.skipped_bytes = self.state.window_start + m.byte_offset as u64;
                    self.state.anchor = Some(m);
                } else {
                    self.state.pending.push(m);
                }
            }
        }
        self.state.scanned = self.state.window.len();
    }

    /// Yield a buffer for every pending match and move the anchor to the last one.
    fn pair_pending(&mut self) {
        let Some(mut anchor) = self.state.anchor else {
            self.drop_unanchored_prefix();
            return;
        };
        for next in std::mem::take(&mut self.state.pending) {
            // a preamble right at a cut point closes nothing
            if next.bit_position() > anchor.bit_position() {
                self.emit(anchor, next.bit_position(), BufferFlags::new());
            }
            anchor = next;
            self.state.anchor_is_cut = false;
        }
        self.state.anchor = Some(anchor);
        self.rebase(anchor.byte_offset);
        self.cap_carry();
    }

    /// Cut an over-long carry at the scan frontier.
    ///
    /// The anchor sits at window byte 0 here. Bytes within one preamble span
    /// of the frontier stay so a straddling preamble can still be found.
    fn cap_carry(&mut self) {
        let Some(anchor) = self.state.anchor else {
            return;
        };
        if self.state.window.len() <= self.max_carry {
            return;
        }
        let cut = self.state.scanned.saturating_sub(self.matcher.max_span() - 1);
        let resume = PreambleMatch { byte_offset: cut, bit_offset: 0, mode: anchor.mode };
        if resume.bit_position() <= anchor.bit_position() {
            return;
        }
        debug!(
            "No preamble within {} bytes of {:#x}, cutting carry",
            self.max_carry,
            self.state.window_start + anchor.byte_offset as u64
        );
        self.emit(anchor, resume.bit_position(), BufferFlags::new());
        self.state.anchor = Some(resume);
        self.state.anchor_is_cut = true;
        self.rebase(cut);
    }

    /// Without an anchor, bytes that cannot start a preamble are junk.
    fn drop_unanchored_prefix(&mut self) {
        let lookback = self.matcher.max_span() - 1;
        let keep_from = self.state.scanned.saturating_sub(lookback);
        self.rebase(keep_from);
    }

    /// Drop `count` leading window bytes and shift relative positions.
    fn rebase(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.state.window.drain(..count);
        self.state.window_start += count as u64;
        self.state.scanned = self.state.scanned.saturating_sub(count);
        if let Some(anchor) = self.state.anchor.as_mut() {
            anchor.byte_offset -= count;
        }
        for m in &mut self.state.pending {
            m.byte_offset -= count;
        }
    }

    fn emit(&mut self, start: PreambleMatch, end_bit: u64, mut flags: BufferFlags) {
        let start_bit = start.bit_position();
        let bit_len = end_bit - start_bit;
        let bytes = extract_bits(&self.state.window, start_bit, end_bit);
        let stream_offset = self.state.window_start + start.byte_offset as u64;
        let index = self.next_index;
        self.next_index += 1;

        let mut event = None;
        if bit_len.abs_diff(self.expected_bits) > self.tolerance_bits {
            flags.insert(BufferFlags::DESYNCHRONIZED);
            warn!(
                "Buffer {} at {:#x} is {} bits, expected {}",
                index, stream_offset, bit_len, self.expected_bits
            );
            event = Some(DiagnosticEvent::DesynchronizedBuffer {
                buffer_index: index,
                stream_offset,
                bit_len,
                expected_bits: self.expected_bits,
            });
        }

        trace!("Buffer {}: offset={:#x}, bits={}, flags={}", index, stream_offset, bit_len, flags);
        let buffer = RawBuffer {
            index,
            stream_offset,
            bit_offset: start.bit_offset,
            mode: start.mode,
            bytes,
            bit_len,
            flags,
        };
        self.ready.push_back((buffer, event));
    }

    /// Final pass once the reader is exhausted.
    fn finish(&mut self) {
        self.scan();
        self.pair_pending();

        match self.state.anchor.take() {
            Some(anchor) => {
                // Bits that do not complete a byte after the last preamble are dropped
                let available = self.state.window.len() as u64 * 8 - anchor.bit_position();
                let end_bit = anchor.bit_position() + available / 8 * 8;
                if end_bit > anchor.bit_position() {
                    let mut flags = BufferFlags::new();
                    flags.insert(BufferFlags::TRAILING);
                    self.emit(anchor, end_bit, flags);
                }
            }
            None => {
                self.skipped_bytes = self.bytes_read;
                warn!("No preamble found in {} bytes", self.bytes_read);
                self.events
                    .push(DiagnosticEvent::NoPreambleFound { bytes_scanned: self.bytes_read });
            }
        }

        self.state.window.clear();
        self.finished = true;
        info!(
            "Synchronizer finished: {} bytes read, {} preambles, {} buffers, {} bytes skipped",
            self.bytes_read, self.matches_found, self.next_index, self.skipped_bytes
        );
    }

    /// Advance by one chunk.
    fn step(&mut self) -> Result<()> {
        if self.state.eof {
            self.finish();
            return Ok(());
        }

        let received = self.read_chunk()?;
        if received < self.chunk_size && received > 0 {
            debug!("Short read: {} of {} bytes", received, self.chunk_size);
            self.events.push(DiagnosticEvent::TruncatedRead {
                requested: self.chunk_size,
                received,
            });
        }

        if received > 0 {
            self.scan();
            self.pair_pending();
        }
        if self.state.eof {
            self.finish();
        }
        Ok(())
    }
}

impl<R: Read> Iterator for StreamSynchronizer<R> {
    type Item = Result<RawBuffer>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((buffer, event)) = self.ready.pop_front() {
                self.events.extend(event);
                return Some(Ok(buffer));
            }
            if self.finished {
                return None;
            }
            if let Err(e) = self.step() {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }
}
