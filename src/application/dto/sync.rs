use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::errors::SyncError;
use crate::domain::assets::AssetRecord;

/// Per-file pipeline position. Terminal states are `SkippedDuplicate`,
/// `Success`, `Failed` and `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Pending,
    Hashing,
    DedupCheck,
    Uploading,
    SkippedDuplicate,
    Success,
    Failed,
    Cancelled,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::Pending => "pending",
            UploadStage::Hashing => "hashing",
            UploadStage::DedupCheck => "dedup_check",
            UploadStage::Uploading => "uploading",
            UploadStage::SkippedDuplicate => "skipped_duplicate",
            UploadStage::Success => "success",
            UploadStage::Failed => "failed",
            UploadStage::Cancelled => "cancelled",
        }
    }
}

/// Broadcast while a batch runs. `bytes_*` are only meaningful during
/// `Uploading`.
#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub batch_id: Uuid,
    pub local_path: String,
    pub stage: UploadStage,
    pub bytes_sent: u64,
    pub bytes_total: u64,
}

/// One document-relative reference to synchronize.
#[derive(Debug, Clone)]
pub struct SyncItem {
    pub local_path: String,
    /// Guessed from the path extension when absent.
    pub content_type: Option<String>,
}

impl SyncItem {
    pub fn new(local_path: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            content_type: None,
        }
    }
}

pub struct SyncRequest {
    pub document_id: String,
    pub share_id: String,
    pub items: Vec<SyncItem>,
    /// Allow reusing another document's upload when fingerprint and size match.
    pub reuse_by_hash: bool,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
pub struct FileFailure {
    pub local_path: String,
    pub error: SyncError,
}

/// Batch outcome: successes and skips both land in `records`; one file's
/// failure never removes its siblings from the report.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub batch_id: Uuid,
    pub records: Vec<AssetRecord>,
    pub uploaded: usize,
    pub skipped: usize,
    pub failures: Vec<FileFailure>,
    /// Paths never attempted (or interrupted) because cancellation was
    /// requested.
    pub cancelled: Vec<String>,
}

impl SyncReport {
    pub fn is_cancelled(&self) -> bool {
        !self.cancelled.is_empty()
    }
}
