//! Recursive character text splitter
//!
//! Splits on paragraph breaks first, then line breaks, then spaces, then
//! single characters, and merges the pieces back into chunks of at most
//! `chunk_size` characters with up to `chunk_overlap` characters carried
//! over between neighbours. Each chunk records its character offset in the
//! source text.

use std::collections::VecDeque;

use crate::error::{LcaError, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 300;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A chunk of a source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
    /// Character offset of the chunk in the source text
    pub start_index: usize,
}

#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(LcaError::Retrieval("chunk_size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(LcaError::Retrieval(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into chunks with start offsets
    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        let pieces = self.split_recursive(text, &SEPARATORS);
        let mut chunks = Vec::with_capacity(pieces.len());
        let mut search_from = 0;
        for piece in pieces {
            let found = text
                .get(search_from..)
                .and_then(|rest| rest.find(piece.as_str()))
                .map(|p| p + search_from)
                .or_else(|| text.find(piece.as_str()));
            let start_index = match found {
                Some(byte) => {
                    search_from = byte + piece.chars().next().map_or(1, char::len_utf8);
                    char_len(&text[..byte])
                }
                None => 0,
            };
            chunks.push(TextChunk { text: piece, start_index });
        }
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (position, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, s)| s.is_empty() || text.contains(**s))
            .map_or((separators.len(), ""), |(i, s)| (i, *s));
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let splits: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut out = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for split in splits {
            if char_len(split) < self.chunk_size {
                fitting.push(split);
                continue;
            }
            if !fitting.is_empty() {
                out.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if remaining.is_empty() {
                out.push(split.to_string());
            } else {
                out.extend(self.split_recursive(split, remaining));
            }
        }
        if !fitting.is_empty() {
            out.extend(self.merge(&fitting, separator));
        }
        out
    }

    /// Merge small pieces into chunks, keeping a trailing overlap window
    fn merge(&self, splits: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for split in splits {
            let len = char_len(split);
            let joiner = if current.is_empty() { 0 } else { sep_len };
            if total + len + joiner > self.chunk_size && !current.is_empty() {
                if let Some(doc) = join(&current, separator) {
                    docs.push(doc);
                }
                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if current.is_empty() { 0 } else { sep_len } > self.chunk_size)
                {
                    let joined = if current.len() > 1 { sep_len } else { 0 };
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    total = total.saturating_sub(char_len(first) + joined);
                }
            }
            if !current.is_empty() {
                total += sep_len;
            }
            current.push_back(split);
            total += len;
        }
        if let Some(doc) = join(&current, separator) {
            docs.push(doc);
        }
        docs
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

fn join(parts: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
