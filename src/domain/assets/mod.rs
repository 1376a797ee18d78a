use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One object successfully placed in remote storage. Immutable once created;
/// removed when its owning document is purged or its share is revoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Document-relative reference this record replaces in the source text.
    pub local_path: String,
    /// Storage key, `{prefix}/{unix_millis}-{fingerprint}{ext}`.
    pub remote_key: String,
    /// Externally resolvable URL (custom domain when configured).
    pub remote_url: String,
    pub content_type: String,
    pub size: u64,
    /// Truncated fingerprint (16 hex chars); not collision-resistant on its own.
    pub content_hash: String,
    pub uploaded_at: DateTime<Utc>,
}

impl AssetRecord {
    /// A fingerprint match with a differing size is a collision, not identity.
    pub fn same_content(&self, content_hash: &str, size: u64) -> bool {
        self.content_hash == content_hash && self.size == size
    }
}

/// The asset set a document currently owns under its published share.
///
/// Exactly one mapping exists per document id; an emptied mapping is deleted
/// rather than retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAssetMapping {
    pub document_id: String,
    pub share_id: String,
    pub assets: Vec<AssetRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derive the storage key for an upload. The timestamp is embedded so a
/// re-upload of edited-then-reverted content never reuses a key.
pub fn object_key(
    path_prefix: &str,
    uploaded_at: DateTime<Utc>,
    content_hash: &str,
    local_path: &str,
) -> String {
    let ext = std::path::Path::new(local_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let name = format!(
        "{}-{}{}",
        uploaded_at.timestamp_millis(),
        content_hash,
        ext
    );
    let prefix = path_prefix.trim_matches('/');
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}/{name}")
    }
}
