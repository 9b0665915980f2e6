//! Fixed-window text chunking

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};

/// Splits text into bounded, contiguous, non-overlapping windows
///
/// Windows are measured in grapheme clusters and never split one. No
/// sentence or word awareness: a chunk may end mid-word. Concatenating the
/// chunks in order reproduces the input exactly.
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    max_chars: usize,
}

impl ChunkSplitter {
    /// Create a splitter with a maximum window size in characters
    pub fn new(max_chars: usize) -> Result<Self> {
        if max_chars == 0 {
            return Err(Error::config("chunk size must be at least 1 character"));
        }
        Ok(Self { max_chars })
    }

    /// Lazily iterate the windows of `text`
    ///
    /// The iterator is restartable: call again to walk the same text from
    /// the start.
    pub fn split<'a>(&self, text: &'a str) -> Windows<'a> {
        Windows {
            remaining: text,
            max_chars: self.max_chars,
        }
    }
}

/// Iterator over the fixed-size windows of a text
pub struct Windows<'a> {
    remaining: &'a str,
    max_chars: usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.remaining.is_empty() {
            return None;
        }

        // Byte offset just past the max_chars-th grapheme, or end of input
        // for a short final window.
        let split_at = self
            .remaining
            .grapheme_indices(true)
            .nth(self.max_chars)
            .map(|(offset, _)| offset)
            .unwrap_or(self.remaining.len());

        let (window, rest) = self.remaining.split_at(split_at);
        self.remaining = rest;
        Some(window)
    }
}
