//! Streaming dictionary compressor
//!
//! Feeds arbitrary-sized chunks through a bounded sliding window and emits
//! tokens incrementally. Matching is confined to the window — bytes from
//! chunks already folded in — so a candidate position inside the chunk
//! currently being scanned breaks the comparison and the coder falls back
//! to shorter matches or literals. The next chunk sees those positions as
//! window content and matches them normally.

use std::collections::VecDeque;

use super::chain::ChainIndex;
use super::token::{serialize, Token};
use super::make_key;
use crate::common::{KEY_LEN, MAX_MATCH, MAX_TRIES, MIN_MATCH, WINDOW_SIZE};

/// Streaming sliding-window compressor producing [`Token`]s.
#[derive(Debug)]
pub struct StreamCompressor {
    window_size: usize,
    max_match: usize,
    window: VecDeque<u8>,
    index: ChainIndex,
    absolute_pos: usize,
    pending: Vec<Token>,
}

impl StreamCompressor {
    /// Create a compressor with the default window and match limits.
    pub fn new() -> Self {
        Self::with_params(WINDOW_SIZE, MAX_MATCH)
    }

    /// Create a compressor with explicit window and match limits.
    ///
    /// `window_size` must fit a `u16` offset and `max_match` a `u8` length;
    /// larger values are clamped at token emission.
    pub fn with_params(window_size: usize, max_match: usize) -> Self {
        Self {
            window_size,
            max_match,
            window: VecDeque::with_capacity(window_size.min(WINDOW_SIZE) + 1),
            index: ChainIndex::new(),
            absolute_pos: 0,
            pending: Vec::new(),
        }
    }

    /// Feed the next chunk of input.
    ///
    /// `_is_last` marks the final chunk; the coder carries no cross-chunk
    /// state that needs finalizing, so the flag documents intent only and a
    /// trailing `feed(&[], true)` is always safe.
    pub fn feed(&mut self, chunk: &[u8], _is_last: bool) {
        self.process_chunk(chunk);
    }

    /// Serialize and drain every token emitted so far.
    pub fn consume_output(&mut self) -> Vec<u8> {
        let out = serialize(&self.pending);
        self.pending.clear();
        out
    }

    /// Drain the emitted tokens without serializing them.
    pub fn take_tokens(&mut self) -> Vec<Token> {
        std::mem::take(&mut self.pending)
    }

    fn process_chunk(&mut self, chunk: &[u8]) {
        let n = chunk.len();
        if n == 0 {
            return;
        }

        // Absolute position of window[0]; the window always holds the input
        // tail [window_start, absolute_pos).
        let window_start = self.absolute_pos - self.window.len();

        let mut i = 0;
        while i < n {
            let mut best_len = 0usize;
            let mut best_offset = 0usize;

            if i + KEY_LEN <= n {
                let key = make_key(&chunk[i..]);
                for j in self.index.candidates(key).take(MAX_TRIES) {
                    let offset = self.absolute_pos + i - j;
                    if offset == 0 || offset > self.window_size {
                        continue;
                    }

                    let limit = self.max_match.min(n - i);
                    let mut k = 0;
                    while k < limit {
                        let pos = j + k;
                        if pos >= self.absolute_pos {
                            // Candidate ran into the current chunk, which is
                            // not part of the window yet.
                            break;
                        }
                        if self.window[pos - window_start] != chunk[i + k] {
                            break;
                        }
                        k += 1;
                    }

                    if k > best_len {
                        best_len = k;
                        best_offset = offset;
                        if best_len == self.max_match {
                            break;
                        }
                    }
                }
            }

            if best_len >= MIN_MATCH {
                self.pending.push(Token::BackRef {
                    offset: best_offset.min(0xFFFF) as u16,
                    length: best_len.min(0xFF) as u8,
                });
                for p in i..i + best_len {
                    if p + KEY_LEN <= n {
                        self.index.register(make_key(&chunk[p..]), self.absolute_pos + p);
                    }
                }
                i += best_len;
            } else {
                self.pending.push(Token::Literal(chunk[i]));
                if i + KEY_LEN <= n {
                    self.index.register(make_key(&chunk[i..]), self.absolute_pos + i);
                }
                i += 1;
            }
        }

        self.window.extend(chunk.iter().copied());
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }
        self.absolute_pos += n;
    }
}

impl Default for StreamCompressor {
    fn default() -> Self {
        Self::new()
    }
}
