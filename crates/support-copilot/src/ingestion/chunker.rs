//! Sentence-aware text chunking with section markers

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// `[Section Name]` markers; the brackets must enclose something
static SECTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\[\]]+\]").expect("valid section pattern"));

/// Sentence terminator followed by whitespace
static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence pattern"));

/// Default minimum chunk length in characters
pub const MIN_CHUNK_LEN: usize = 10;

/// Text chunker with a target size and a noise floor
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    target_size: usize,
    /// Minimum chunk size
    min_len: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(500)
    }
}

/// A run of text introduced by an optional section marker
struct Section<'a> {
    marker: Option<&'a str>,
    body: &'a str,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(target_size: usize) -> Self {
        Self {
            target_size,
            min_len: MIN_CHUNK_LEN,
        }
    }

    /// Override the minimum chunk length
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Chunk text, logging and returning an empty list on failure
    pub fn chunk(&self, text: &str) -> Vec<String> {
        match self.try_chunk(text) {
            Ok(chunks) => {
                tracing::debug!("Created {} chunks from text", chunks.len());
                chunks
            }
            Err(e) => {
                tracing::error!("Text chunking failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Chunk text.
    ///
    /// Whitespace is collapsed first. Each `[Section]` marker starts a new
    /// chunk and stays as its prefix. Sentences are packed greedily up to
    /// `target_size` characters; a sentence longer than that is kept whole.
    /// Chunks under the minimum length are dropped.
    pub fn try_chunk(&self, text: &str) -> Result<Vec<String>> {
        if self.target_size == 0 {
            return Err(Error::invalid("chunk target size must be positive"));
        }

        let normalized = WHITESPACE.replace_all(text, " ");
        let normalized = normalized.trim();

        let mut chunks = Vec::new();
        for section in split_sections(normalized) {
            self.pack_section(&section, &mut chunks);
        }

        chunks.retain(|c| c.chars().count() >= self.min_len);
        Ok(chunks)
    }

    fn pack_section(&self, section: &Section<'_>, chunks: &mut Vec<String>) {
        let mut current = section.marker.map(str::to_string).unwrap_or_default();
        let mut current_len = current.chars().count();
        // A marker alone is a seed, not content
        let mut has_body = false;

        for sentence in split_sentences(section.body) {
            let sentence_len = sentence.chars().count();

            if current.is_empty() {
                current.push_str(sentence);
                current_len = sentence_len;
                has_body = true;
                continue;
            }

            // The marker always keeps its first sentence so the prefix survives
            if !has_body || current_len + 1 + sentence_len <= self.target_size {
                current.push(' ');
                current.push_str(sentence);
                current_len += 1 + sentence_len;
                has_body = true;
            } else {
                chunks.push(std::mem::take(&mut current));
                current.push_str(sentence);
                current_len = sentence_len;
            }
        }

        if has_body {
            chunks.push(current);
        }
    }
}

/// Split normalized text at section markers
fn split_sections(text: &str) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    let mut marker = None;
    let mut cursor = 0;

    for m in SECTION_MARKER.find_iter(text) {
        let body = &text[cursor..m.start()];
        if marker.is_some() || !body.trim().is_empty() {
            sections.push(Section { marker, body });
        }
        marker = Some(m.as_str());
        cursor = m.end();
    }

    let body = &text[cursor..];
    if marker.is_some() || !body.trim().is_empty() {
        sections.push(Section { marker, body });
    }

    sections
}

/// Split text after `.`, `!` or `?` followed by whitespace
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_BREAK.find_iter(text) {
        // The terminator is a single ASCII byte
        let sentence = text[start..m.start() + 1].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }

    sentences
}
