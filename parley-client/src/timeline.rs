//! Append-only conversation timeline

use crate::render::{Author, TimelineEntry};

/// Ordered record of rendered entries
///
/// Entries are only ever appended; nothing is removed or reordered.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: TimelineEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TimelineEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries written by one author, in order
    pub fn by_author(&self, author: Author) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter().filter(move |e| e.author == author)
    }
}
