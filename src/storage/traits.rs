use anyhow::Result;
use async_trait::async_trait;

use crate::types::{CollectedData, ItemId};

/// Persistence for collected items. Agents only write through this; the
/// backing database lives outside the crate.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Returns how many items were newly stored.
    async fn save_batch(&self, items: &[CollectedData]) -> Result<usize>;
    async fn get(&self, id: ItemId) -> Result<Option<CollectedData>>;
    async fn list_by_source(&self, source_id: &str) -> Result<Vec<CollectedData>>;
    async fn count(&self) -> Result<usize>;
}
