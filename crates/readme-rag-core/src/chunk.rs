//! Overlapping, boundary-aware text chunker.
//!
//! Splits a document into [`Chunk`]s of at most `chunk_size` characters,
//! where each chunk after the first starts `overlap` characters before the
//! end of the previous one. Boundaries snap to a sentence end (`.`) or a
//! line break when one is available in the second half of the window.
//!
//! All offsets count `char`s, never bytes, so multi-byte text is never cut
//! inside a character.
//!
//! # Algorithm
//!
//! 1. Start at offset 0 and propose `end = min(start + chunk_size, len)`.
//! 2. Unless `end` is the end of the text, find the last `.` and the last
//!    `\n` in `[start, end)`. If the `.` lies past `start + chunk_size / 2`,
//!    end the chunk just after it; otherwise do the same for the `\n`.
//!    If neither qualifies, the raw offset is kept, even mid-word.
//! 3. Emit `[start, end)`. Stop if `end == len`.
//! 4. Continue from `end - overlap`, always moving forward by at least one
//!    character.
//!
//! # Example
//!
//! ```rust
//! use readme_rag_core::chunk::{chunk_spans, ChunkConfig};
//!
//! let text = "A".repeat(1500);
//! let spans = chunk_spans(&text, &ChunkConfig::default());
//! assert_eq!(spans, vec![0..1000, 800..1500]);
//! ```

use std::ops::Range;

use crate::error::ConfigError;
use crate::models::{Chunk, Document};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_OVERLAP: usize = 200;

/// Validated chunking parameters.
///
/// Only constructible through [`ChunkConfig::new`], which rejects
/// `overlap >= chunk_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `chunk_size` is zero or `overlap` is not
    /// strictly smaller than `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if overlap >= chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Compute chunk boundaries as character ranges.
///
/// Spans are ordered, cover `text` without gaps, and are each at most
/// `chunk_size` characters long. Empty text yields no spans.
pub fn chunk_spans(text: &str, config: &ChunkConfig) -> Vec<Range<usize>> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut spans = Vec::new();
    let mut start = 0;

    while start < len {
        let mut end = (start + config.chunk_size).min(len);

        if end < len {
            let midpoint = start + config.chunk_size / 2;
            let window = &chars[start..end];
            let last_period = window.iter().rposition(|&c| c == '.').map(|i| start + i);
            let last_newline = window.iter().rposition(|&c| c == '\n').map(|i| start + i);

            if let Some(pos) = last_period.filter(|&p| p > midpoint) {
                end = pos + 1;
            } else if let Some(pos) = last_newline.filter(|&p| p > midpoint) {
                end = pos + 1;
            }
        }

        spans.push(start..end);

        if end >= len {
            break;
        }
        start = end.saturating_sub(config.overlap).max(start + 1);
    }

    spans
}

/// Split `text` into chunk strings. See [`chunk_spans`].
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Vec<String> {
    let offsets = byte_offsets(text);
    chunk_spans(text, config)
        .into_iter()
        .map(|span| text[offsets[span.start]..offsets[span.end]].to_string())
        .collect()
}

/// Split a document into [`Chunk`]s with sequential `chunk_id`s from 0.
pub fn chunk_document(document: &Document, config: &ChunkConfig) -> Vec<Chunk> {
    let text = &document.text;
    let offsets = byte_offsets(text);
    chunk_spans(text, config)
        .into_iter()
        .enumerate()
        .map(|(chunk_id, span)| Chunk {
            chunk_id,
            file_name: document.file_name.clone(),
            text: text[offsets[span.start]..offsets[span.end]].to_string(),
            start: span.start,
            end: span.end,
        })
        .collect()
}

/// Byte offset of every char index, plus one trailing entry for `text.len()`.
fn byte_offsets(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}
