use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::assets::{AssetRecord, DocumentAssetMapping};

/// Durable document → uploaded-objects mapping with reverse lookups used to
/// skip redundant uploads. Implementations must make each mutation durable
/// before returning and must never retain an emptied mapping.
#[async_trait]
pub trait AssetIndexRepository: Send + Sync {
    async fn find_by_document(
        &self,
        document_id: &str,
    ) -> anyhow::Result<Option<DocumentAssetMapping>>;

    /// Linear scan across all mappings' assets. Callers must still compare
    /// sizes before treating a hit as identical content.
    async fn find_by_hash(&self, content_hash: &str) -> anyhow::Result<Option<AssetRecord>>;

    async fn find_by_local_path(&self, local_path: &str) -> anyhow::Result<Option<AssetRecord>>;

    /// Replace the document's share id and asset collection. An empty asset
    /// collection removes the mapping entirely.
    async fn upsert(
        &self,
        document_id: &str,
        share_id: &str,
        assets: Vec<AssetRecord>,
    ) -> anyhow::Result<()>;

    async fn remove_by_document(
        &self,
        document_id: &str,
    ) -> anyhow::Result<Option<DocumentAssetMapping>>;

    async fn remove_by_share(&self, share_id: &str)
    -> anyhow::Result<Vec<DocumentAssetMapping>>;

    /// Remove individual assets by remote key, dropping any mapping this
    /// empties. Returns how many records were removed.
    async fn remove_assets(&self, keys: &HashSet<String>) -> anyhow::Result<usize>;

    /// Remove every asset the predicate matches; returns the removed keys.
    async fn remove_matching(
        &self,
        predicate: &(dyn for<'a> Fn(&'a AssetRecord) -> bool + Send + Sync),
    ) -> anyhow::Result<Vec<String>>;
}
