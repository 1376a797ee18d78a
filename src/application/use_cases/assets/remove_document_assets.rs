use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::asset_index::AssetIndexRepository;
use crate::application::ports::object_transport::{ObjectTransport, TransportFailure};
use crate::application::services::signing;
use crate::domain::assets::AssetRecord;
use crate::domain::storage::StorageProfile;

#[derive(Debug, Default)]
pub struct RemovalReport {
    pub removed_records: usize,
    pub deleted_objects: usize,
    pub failed_objects: usize,
}

/// Drops a document's mapping and reclaims its remote objects. Object
/// deletion is best-effort: a missing object counts as deleted and a failed
/// delete is logged and counted, never fatal for the sweep.
pub struct RemoveDocumentAssets<'a, I, T>
where
    I: AssetIndexRepository + ?Sized,
    T: ObjectTransport + ?Sized,
{
    pub index: &'a I,
    pub transport: &'a T,
    pub profile: &'a StorageProfile,
}

impl<'a, I, T> RemoveDocumentAssets<'a, I, T>
where
    I: AssetIndexRepository + ?Sized,
    T: ObjectTransport + ?Sized,
{
    pub async fn execute(
        &self,
        document_id: &str,
        cancel: &CancellationToken,
    ) -> anyhow::Result<RemovalReport> {
        let Some(mapping) = self.index.remove_by_document(document_id).await? else {
            return Ok(RemovalReport::default());
        };

        let mut report = RemovalReport {
            removed_records: mapping.assets.len(),
            ..Default::default()
        };
        sweep_remote(
            self.transport,
            self.profile,
            &mapping.assets,
            cancel,
            &mut report,
        )
        .await;

        tracing::info!(
            document_id = %document_id,
            removed = report.removed_records,
            deleted = report.deleted_objects,
            failed = report.failed_objects,
            "document_assets_removed"
        );
        Ok(report)
    }
}

/// Shared by the document- and share-scoped sweeps.
pub(crate) async fn sweep_remote<T>(
    transport: &T,
    profile: &StorageProfile,
    assets: &[AssetRecord],
    cancel: &CancellationToken,
    report: &mut RemovalReport,
) where
    T: ObjectTransport + ?Sized,
{
    for asset in assets {
        if cancel.is_cancelled() {
            tracing::debug!(remote_key = %asset.remote_key, "remote_sweep_cancelled");
            report.failed_objects += 1;
            continue;
        }
        let headers = match signing::sign(profile, "DELETE", &asset.remote_key, "", Utc::now()) {
            Ok(headers) => headers,
            Err(err) => {
                tracing::warn!(error = ?err, remote_key = %asset.remote_key, "delete_signing_failed");
                report.failed_objects += 1;
                continue;
            }
        };
        let url = profile.object_url(&asset.remote_key);
        match transport.delete(&url, &headers, cancel).await {
            Ok(()) => report.deleted_objects += 1,
            Err(TransportFailure::Rejected { status: 404, .. }) => {
                // already gone: idempotent delete
                report.deleted_objects += 1;
            }
            Err(err) => {
                tracing::warn!(error = ?err, remote_key = %asset.remote_key, "remote_delete_failed");
                report.failed_objects += 1;
            }
        }
    }
}
