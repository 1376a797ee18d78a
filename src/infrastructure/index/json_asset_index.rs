use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::asset_index::AssetIndexRepository;
use crate::domain::assets::{AssetRecord, DocumentAssetMapping};

/// Whole-file JSON persistence: the collection is loaded once at open and the
/// file rewritten wholesale on every mutation. Lookups are linear scans;
/// acceptable for single-user document sets. Writers hold the lock across
/// read-modify-persist, so concurrent batches serialize.
pub struct JsonAssetIndex {
    path: PathBuf,
    state: RwLock<Vec<DocumentAssetMapping>>,
}

impl JsonAssetIndex {
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parse asset index at {}", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("read asset index at {}", path.display())));
            }
        };
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Write-then-rename so a partial file is never observable.
    fn persist(&self, mappings: &[DocumentAssetMapping]) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(mappings)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let tmp = tempfile::NamedTempFile::new_in(&dir)?;
        std::fs::write(tmp.path(), &json)?;
        tmp.persist(&self.path)
            .map_err(|e| anyhow::anyhow!("replace asset index: {e}"))?;
        Ok(())
    }
}

#[async_trait]
impl AssetIndexRepository for JsonAssetIndex {
    async fn find_by_document(
        &self,
        document_id: &str,
    ) -> anyhow::Result<Option<DocumentAssetMapping>> {
        let state = self.state.read().await;
        Ok(state.iter().find(|m| m.document_id == document_id).cloned())
    }

    async fn find_by_hash(&self, content_hash: &str) -> anyhow::Result<Option<AssetRecord>> {
        let state = self.state.read().await;
        Ok(state
            .iter()
            .flat_map(|m| m.assets.iter())
            .find(|a| a.content_hash == content_hash)
            .cloned())
    }

    async fn find_by_local_path(&self, local_path: &str) -> anyhow::Result<Option<AssetRecord>> {
        let state = self.state.read().await;
        Ok(state
            .iter()
            .flat_map(|m| m.assets.iter())
            .find(|a| a.local_path == local_path)
            .cloned())
    }

    async fn upsert(
        &self,
        document_id: &str,
        share_id: &str,
        assets: Vec<AssetRecord>,
    ) -> anyhow::Result<()> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let created_at = state
            .iter()
            .find(|m| m.document_id == document_id)
            .map(|m| m.created_at)
            .unwrap_or(now);
        state.retain(|m| m.document_id != document_id);
        if !assets.is_empty() {
            state.push(DocumentAssetMapping {
                document_id: document_id.to_string(),
                share_id: share_id.to_string(),
                assets,
                created_at,
                updated_at: now,
            });
        }
        self.persist(&state)
    }

    async fn remove_by_document(
        &self,
        document_id: &str,
    ) -> anyhow::Result<Option<DocumentAssetMapping>> {
        let mut state = self.state.write().await;
        let Some(pos) = state.iter().position(|m| m.document_id == document_id) else {
            return Ok(None);
        };
        let removed = state.remove(pos);
        self.persist(&state)?;
        Ok(Some(removed))
    }

    async fn remove_by_share(
        &self,
        share_id: &str,
    ) -> anyhow::Result<Vec<DocumentAssetMapping>> {
        let mut state = self.state.write().await;
        let removed: Vec<DocumentAssetMapping> = state
            .iter()
            .filter(|m| m.share_id == share_id)
            .cloned()
            .collect();
        if removed.is_empty() {
            return Ok(removed);
        }
        state.retain(|m| m.share_id != share_id);
        self.persist(&state)?;
        Ok(removed)
    }

    async fn remove_assets(&self, keys: &HashSet<String>) -> anyhow::Result<usize> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut removed = 0;
        for mapping in state.iter_mut() {
            let before = mapping.assets.len();
            mapping.assets.retain(|a| !keys.contains(&a.remote_key));
            if mapping.assets.len() != before {
                mapping.updated_at = now;
                removed += before - mapping.assets.len();
            }
        }
        if removed == 0 {
            return Ok(0);
        }
        // an emptied mapping is deleted, never retained
        state.retain(|m| !m.assets.is_empty());
        self.persist(&state)?;
        Ok(removed)
    }

    async fn remove_matching(
        &self,
        predicate: &(dyn for<'a> Fn(&'a AssetRecord) -> bool + Send + Sync),
    ) -> anyhow::Result<Vec<String>> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut removed_keys = Vec::new();
        for mapping in state.iter_mut() {
            let before = mapping.assets.len();
            mapping.assets.retain(|a| {
                if predicate(a) {
                    removed_keys.push(a.remote_key.clone());
                    false
                } else {
                    true
                }
            });
            if mapping.assets.len() != before {
                mapping.updated_at = now;
            }
        }
        if removed_keys.is_empty() {
            return Ok(removed_keys);
        }
        state.retain(|m| !m.assets.is_empty());
        self.persist(&state)?;
        Ok(removed_keys)
    }
}
