use std::io::{self, Read, Seek, SeekFrom};

use memchr::memchr_iter;
use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::signature::{Signature, SignatureKind};

/// Sources are consumed in chunks of this size, into a reusable buffer.
pub const SCAN_CHUNK_SIZE: usize = 1024 * 1024;

/// A signature occurrence at an absolute stream offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub signature: Signature,
    pub offset: u64,
}

/// Streaming scanner that reports every offset where any of a set of
/// signatures matches.
///
/// Chunks are processed sequentially; within one chunk all signatures are
/// searched in parallel over the read-only window. The last
/// `max_pattern_len - 1` bytes of each chunk are carried into the next
/// window, so matches straddling a chunk boundary are found too.
pub struct PatternScanner {
    buffer: Vec<u8>,
}

impl Default for PatternScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternScanner {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Scan a seekable source against `signatures`.
    ///
    /// Seekable sources are always scanned from absolute offset 0,
    /// regardless of the current cursor position.
    pub fn scan<R: Read + Seek>(
        &mut self,
        source: &mut R,
        signatures: &[Signature],
    ) -> Result<Vec<PatternMatch>> {
        source.seek(SeekFrom::Start(0))?;
        self.scan_forward(source, signatures)
    }

    /// Scan a non-seekable source from its current position forward.
    /// Reported offsets are relative to the scan start.
    pub fn scan_forward<R: Read>(
        &mut self,
        source: &mut R,
        signatures: &[Signature],
    ) -> Result<Vec<PatternMatch>> {
        let Some(max_len) = signatures.iter().map(Signature::len).max() else {
            return Ok(Vec::new());
        };
        let overlap = max_len.saturating_sub(1);

        self.buffer.resize(overlap + SCAN_CHUNK_SIZE, 0);

        let mut matches = Vec::new();
        let mut tail_len = 0usize;
        let mut consumed = 0u64;

        loop {
            let read = read_chunk(source, &mut self.buffer[tail_len..tail_len + SCAN_CHUNK_SIZE])?;
            if read == 0 {
                break;
            }

            let window_len = tail_len + read;
            let window_base = consumed - tail_len as u64;
            let window = &self.buffer[..window_len];

            let found: Vec<PatternMatch> = signatures
                .par_iter()
                .flat_map_iter(|signature| find_in_window(signature, window, window_base))
                .collect();
            matches.extend(found);

            consumed += read as u64;

            // Carry the window tail over so boundary-spanning candidates
            // get a second look in the next round.
            let keep = overlap.min(window_len);
            if keep > 0 {
                self.buffer.copy_within(window_len - keep..window_len, 0);
            }
            tail_len = keep;

            if read < SCAN_CHUNK_SIZE {
                break;
            }
        }

        // The overlap reports tail matches twice; identity is (signature, offset).
        matches.sort_by(|a, b| {
            (a.offset, a.signature.canonical_text())
                .cmp(&(b.offset, b.signature.canonical_text()))
        });
        matches.dedup();

        debug!(
            "Scan complete: {} bytes, {} signatures, {} matches",
            consumed,
            signatures.len(),
            matches.len()
        );

        Ok(matches)
    }
}

fn find_in_window(signature: &Signature, window: &[u8], base: u64) -> Vec<PatternMatch> {
    let len = signature.len();
    if len == 0 || window.len() < len {
        return Vec::new();
    }

    // Magic signatures only count at the very start of the stream.
    if signature.kind() == SignatureKind::Magic {
        if base == 0 && signature.matches_at(window) {
            return vec![PatternMatch {
                signature: signature.clone(),
                offset: 0,
            }];
        }
        return Vec::new();
    }

    let mut found = Vec::new();
    let last = window.len() - len;

    if let Some(first_byte) = signature.first_literal() {
        for i in memchr_iter(first_byte, &window[..=last]) {
            if signature.matches_at(&window[i..]) {
                found.push(PatternMatch {
                    signature: signature.clone(),
                    offset: base + i as u64,
                });
            }
        }
    } else {
        for i in 0..=last {
            if signature.matches_at(&window[i..]) {
                found.push(PatternMatch {
                    signature: signature.clone(),
                    offset: base + i as u64,
                });
            }
        }
    }

    found
}

/// Fill `buf` as far as the source allows; a short count means EOF.
fn read_chunk<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
