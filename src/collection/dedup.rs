use std::collections::HashSet;

use crate::types::CollectedData;

/// Hash set scoped to a single collection run.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
    duplicates: usize,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the item is new to this run and should be kept.
    pub fn admit(&mut self, item: &CollectedData) -> bool {
        if self.seen.insert(item.hash.clone()) {
            true
        } else {
            self.duplicates += 1;
            false
        }
    }

    pub fn filter(&mut self, items: Vec<CollectedData>) -> Vec<CollectedData> {
        items.into_iter().filter(|item| self.admit(item)).collect()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn unique(&self) -> usize {
        self.seen.len()
    }
}
