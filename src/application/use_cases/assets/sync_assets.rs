use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::dto::sync::{
    FileFailure, SyncEvent, SyncItem, SyncReport, SyncRequest, UploadStage,
};
use crate::application::errors::SyncError;
use crate::application::ports::asset_index::AssetIndexRepository;
use crate::application::ports::blob_source::BlobSource;
use crate::application::ports::object_transport::{ObjectTransport, ProgressFn, TransportFailure};
use crate::application::ports::relay_uploader::{RelayRequest, RelayUploader};
use crate::application::services::{fingerprint, signing};
use crate::domain::assets::{self, AssetRecord};
use crate::domain::storage::StorageProfile;

enum FileOutcome {
    Uploaded(AssetRecord),
    Skipped(AssetRecord),
}

/// Drives a batch of files through
/// `Pending → Hashing → DedupCheck → (SkippedDuplicate | Uploading) →
/// (Success | Failed | Cancelled)`, one file at a time. Per-file errors are
/// collected; only missing configuration aborts the whole batch.
pub struct SyncAssets<'a, I, T, B>
where
    I: AssetIndexRepository + ?Sized,
    T: ObjectTransport + ?Sized,
    B: BlobSource + ?Sized,
{
    pub index: &'a I,
    pub transport: &'a T,
    pub blobs: &'a B,
    pub relay: Option<&'a dyn RelayUploader>,
    pub profile: &'a StorageProfile,
    pub events: &'a broadcast::Sender<SyncEvent>,
}

impl<'a, I, T, B> SyncAssets<'a, I, T, B>
where
    I: AssetIndexRepository + ?Sized,
    T: ObjectTransport + ?Sized,
    B: BlobSource + ?Sized,
{
    pub async fn execute(&self, req: SyncRequest) -> anyhow::Result<SyncReport> {
        if let Some(field) = self.profile.incomplete_field() {
            return Err(SyncError::Configuration(field).into());
        }

        let batch_id = Uuid::new_v4();
        let mut report = SyncReport {
            batch_id,
            ..Default::default()
        };

        for item in &req.items {
            if req.cancel.is_cancelled() {
                self.emit(batch_id, &item.local_path, UploadStage::Cancelled, 0, 0);
                report.cancelled.push(item.local_path.clone());
                continue;
            }
            match self.sync_one(batch_id, &req, item).await {
                Ok(FileOutcome::Uploaded(record)) => {
                    report.uploaded += 1;
                    report.records.push(record);
                }
                Ok(FileOutcome::Skipped(record)) => {
                    report.skipped += 1;
                    report.records.push(record);
                }
                Err(SyncError::Cancelled) => {
                    self.emit(batch_id, &item.local_path, UploadStage::Cancelled, 0, 0);
                    report.cancelled.push(item.local_path.clone());
                }
                Err(error) => {
                    tracing::warn!(
                        error = ?error,
                        local_path = %item.local_path,
                        "asset_upload_failed"
                    );
                    self.emit(batch_id, &item.local_path, UploadStage::Failed, 0, 0);
                    report.failures.push(FileFailure {
                        local_path: item.local_path.clone(),
                        error,
                    });
                }
            }
        }

        if !report.records.is_empty() {
            self.index
                .upsert(&req.document_id, &req.share_id, report.records.clone())
                .await?;
        }

        tracing::info!(
            batch_id = %batch_id,
            document_id = %req.document_id,
            uploaded = report.uploaded,
            skipped = report.skipped,
            failed = report.failures.len(),
            cancelled = report.cancelled.len(),
            "asset_sync_completed"
        );
        Ok(report)
    }

    async fn sync_one(
        &self,
        batch_id: Uuid,
        req: &SyncRequest,
        item: &SyncItem,
    ) -> Result<FileOutcome, SyncError> {
        let path = item.local_path.as_str();
        self.emit(batch_id, path, UploadStage::Pending, 0, 0);

        self.emit(batch_id, path, UploadStage::Hashing, 0, 0);
        let bytes = self.blobs.fetch(path).await.map_err(SyncError::Blob)?;
        let content_hash = fingerprint::fingerprint(&bytes);
        let size = bytes.len() as u64;

        self.emit(batch_id, path, UploadStage::DedupCheck, 0, 0);
        if let Some(existing) = self
            .index
            .find_by_local_path(path)
            .await
            .map_err(SyncError::Index)?
        {
            if existing.same_content(&content_hash, size) {
                self.emit(batch_id, path, UploadStage::SkippedDuplicate, 0, 0);
                return Ok(FileOutcome::Skipped(existing));
            }
            // same reference, edited content: upload fresh under a new key
        } else if req.reuse_by_hash {
            if let Some(existing) = self
                .index
                .find_by_hash(&content_hash)
                .await
                .map_err(SyncError::Index)?
            {
                // truncated fingerprints can collide; a differing size means a
                // distinct asset, not a duplicate
                if existing.size == size {
                    self.emit(batch_id, path, UploadStage::SkippedDuplicate, 0, 0);
                    let record = AssetRecord {
                        local_path: path.to_string(),
                        ..existing
                    };
                    return Ok(FileOutcome::Skipped(record));
                }
            }
        }

        let content_type = item.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });
        let uploaded_at = Utc::now();
        let key = assets::object_key(&self.profile.path_prefix, uploaded_at, &content_hash, path);
        let url = self.profile.object_url(&key);
        let headers = signing::sign(self.profile, "PUT", &key, &content_type, uploaded_at)
            .map_err(SyncError::Signing)?;

        self.emit(batch_id, path, UploadStage::Uploading, 0, size);
        let payload = Bytes::from(bytes);
        let progress = self.progress_fn(batch_id, path.to_string());
        match self
            .transport
            .put(&url, &headers, payload.clone(), progress, &req.cancel)
            .await
        {
            Ok(()) => {}
            Err(TransportFailure::Cancelled) => return Err(SyncError::Cancelled),
            Err(TransportFailure::Rejected { status, body }) => {
                return Err(SyncError::RemoteRejected { status, body });
            }
            Err(TransportFailure::Unreachable(cause)) => {
                if req.cancel.is_cancelled() {
                    return Err(SyncError::Cancelled);
                }
                let relay = self.relay.ok_or(SyncError::Configuration("relay"))?;
                tracing::debug!(
                    error = ?cause,
                    local_path = %path,
                    "direct_transport_failed_trying_relay"
                );
                relay
                    .forward(RelayRequest {
                        url: &url,
                        method: "PUT",
                        headers: &headers,
                        payload: &payload,
                        local_path: path,
                        content_type: &content_type,
                    })
                    .await
                    .map_err(SyncError::Transport)?;
            }
        }

        self.emit(batch_id, path, UploadStage::Success, size, size);
        Ok(FileOutcome::Uploaded(AssetRecord {
            local_path: path.to_string(),
            remote_key: key.clone(),
            remote_url: self.profile.public_url(&key),
            content_type,
            size,
            content_hash,
            uploaded_at,
        }))
    }

    fn progress_fn(&self, batch_id: Uuid, local_path: String) -> ProgressFn {
        let tx = self.events.clone();
        Arc::new(move |bytes_sent, bytes_total| {
            let _ = tx.send(SyncEvent {
                batch_id,
                local_path: local_path.clone(),
                stage: UploadStage::Uploading,
                bytes_sent,
                bytes_total,
            });
        })
    }

    fn emit(&self, batch_id: Uuid, local_path: &str, stage: UploadStage, sent: u64, total: u64) {
        let _ = self.events.send(SyncEvent {
            batch_id,
            local_path: local_path.to_string(),
            stage,
            bytes_sent: sent,
            bytes_total: total,
        });
    }
}
