//! Release table
//!
//! Merges release entries from several sources into one entry per version.

use crate::core::ledger::ReleaseEntry;
use crate::core::ledger::render::sort_entries;
use std::collections::HashMap;

/// Entries keyed by version, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct ReleaseTable {
    entries: Vec<ReleaseEntry>,
    index: HashMap<String, usize>,
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ReleaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, version: &str) -> &mut ReleaseEntry {
        let idx = match self.index.get(version) {
            Some(&idx) => idx,
            None => {
                self.index.insert(version.to_string(), self.entries.len());
                self.entries.push(ReleaseEntry::new(version));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }

    /// Merge an entry; fields already set for its version are kept
    ///
    /// Entries without a version are ignored.
    pub fn merge(&mut self, entry: ReleaseEntry) {
        if entry.version.trim().is_empty() {
            return;
        }

        let current = self.slot(&entry.version);
        fill(&mut current.date, non_empty(entry.date));
        fill(&mut current.url, non_empty(entry.url));
        fill(&mut current.sha256, entry.sha256);
    }

    /// Record a release date, adding the version if it is new
    pub fn merge_date(&mut self, version: &str, date: &str) {
        if version.trim().is_empty() {
            return;
        }
        let date = non_empty(Some(date.to_string()));
        fill(&mut self.slot(version).date, date);
    }

    /// Keep only the entries matching `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&ReleaseEntry) -> bool) {
        self.entries.retain(|e| keep(e));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.version.clone(), idx))
            .collect();
    }

    pub fn get(&self, version: &str) -> Option<&ReleaseEntry> {
        self.index.get(version).map(|&idx| &self.entries[idx])
    }

    pub fn entries(&self) -> &[ReleaseEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [ReleaseEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries newest first
    pub fn into_sorted(self) -> Vec<ReleaseEntry> {
        let mut entries = self.entries;
        sort_entries(&mut entries);
        entries
    }
}

impl FromIterator<ReleaseEntry> for ReleaseTable {
    fn from_iter<I: IntoIterator<Item = ReleaseEntry>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.merge(entry);
        }
        table
    }
}
