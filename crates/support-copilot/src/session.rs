//! In-process draft history and counters
//!
//! Lives for the lifetime of the process; nothing is persisted.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

use crate::logging::preview;
use crate::types::GenerationResult;

/// Entries kept before the oldest is evicted
pub const HISTORY_CAPACITY: usize = 50;

const ISSUE_PREVIEW_CHARS: usize = 80;
const RESPONSE_PREVIEW_CHARS: usize = 100;

/// One drafted reply, abbreviated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub issue_preview: String,
    pub response_preview: String,
    pub response_tone: String,
    pub model_used: String,
    pub created_at: DateTime<Utc>,
}

/// Session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Drafts produced since start
    pub drafts: u64,
    /// Words across all drafted replies
    pub words_drafted: u64,
    /// Entries currently in the history
    pub history_len: usize,
}

#[derive(Default)]
struct SessionInner {
    entries: VecDeque<HistoryEntry>,
    drafts: u64,
    words: u64,
}

/// Newest-first bounded history of drafts
pub struct SessionHistory {
    inner: RwLock<SessionInner>,
    capacity: usize,
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

fn abbreviate(text: &str, max_chars: usize) -> String {
    let head = preview(text, max_chars);
    if head.len() < text.len() {
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

impl SessionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(SessionInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Record a drafted reply and return its entry
    pub fn record(&self, issue: &str, response_tone: &str, result: &GenerationResult) -> HistoryEntry {
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            issue_preview: abbreviate(issue.trim(), ISSUE_PREVIEW_CHARS),
            response_preview: abbreviate(&result.response_text, RESPONSE_PREVIEW_CHARS),
            response_tone: response_tone.to_string(),
            model_used: result.model_used.clone(),
            created_at: Utc::now(),
        };

        let mut inner = self.inner.write();
        inner.drafts += 1;
        inner.words += result.word_count() as u64;
        inner.entries.push_front(entry.clone());
        inner.entries.truncate(self.capacity);
        tracing::info!("Successfully generated response #{}", inner.drafts);

        entry
    }

    /// Entries, newest first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.inner.read().entries.iter().cloned().collect()
    }

    /// Drop all entries; counters are kept
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.write();
        let removed = inner.entries.len();
        inner.entries.clear();
        removed
    }

    pub fn stats(&self) -> SessionStats {
        let inner = self.inner.read();
        SessionStats {
            drafts: inner.drafts,
            words_drafted: inner.words,
            history_len: inner.entries.len(),
        }
    }
}
