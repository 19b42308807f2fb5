use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::traits::DataStore;
use crate::types::{CollectedData, ItemId};

/// Keeps items keyed by content hash, so the same content collected in
/// different runs is stored once.
#[derive(Clone, Default)]
pub struct InMemoryDataStore {
    items: Arc<RwLock<HashMap<String, CollectedData>>>,
}

impl InMemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("In-memory store lock poisoned")
}

#[async_trait]
impl DataStore for InMemoryDataStore {
    async fn save_batch(&self, batch: &[CollectedData]) -> Result<usize> {
        let mut items = self.items.write().map_err(poisoned)?;
        let mut stored = 0;

        for item in batch {
            if !items.contains_key(&item.hash) {
                items.insert(item.hash.clone(), item.clone());
                stored += 1;
            }
        }

        Ok(stored)
    }

    async fn get(&self, id: ItemId) -> Result<Option<CollectedData>> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.values().find(|item| item.id == id).cloned())
    }

    async fn list_by_source(&self, source_id: &str) -> Result<Vec<CollectedData>> {
        let items = self.items.read().map_err(poisoned)?;
        let mut matching: Vec<CollectedData> = items
            .values()
            .filter(|item| item.source_id == source_id)
            .cloned()
            .collect();
        matching.sort_by_key(|item| item.collected_at);
        Ok(matching)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.items.read().map_err(poisoned)?.len())
    }
}
