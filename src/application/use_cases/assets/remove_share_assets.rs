use tokio_util::sync::CancellationToken;

use crate::application::ports::asset_index::AssetIndexRepository;
use crate::application::ports::object_transport::ObjectTransport;
use crate::application::use_cases::assets::remove_document_assets::{RemovalReport, sweep_remote};
use crate::domain::storage::StorageProfile;

/// Revoking a share drops every mapping published under it and reclaims the
/// objects those mappings owned. Unrelated documents are untouched.
pub struct RemoveShareAssets<'a, I, T>
where
    I: AssetIndexRepository + ?Sized,
    T: ObjectTransport + ?Sized,
{
    pub index: &'a I,
    pub transport: &'a T,
    pub profile: &'a StorageProfile,
}

impl<'a, I, T> RemoveShareAssets<'a, I, T>
where
    I: AssetIndexRepository + ?Sized,
    T: ObjectTransport + ?Sized,
{
    pub async fn execute(
        &self,
        share_id: &str,
        cancel: &CancellationToken,
    ) -> anyhow::Result<RemovalReport> {
        let mappings = self.index.remove_by_share(share_id).await?;

        let mut report = RemovalReport::default();
        for mapping in &mappings {
            report.removed_records += mapping.assets.len();
            sweep_remote(
                self.transport,
                self.profile,
                &mapping.assets,
                cancel,
                &mut report,
            )
            .await;
        }

        tracing::info!(
            share_id = %share_id,
            documents = mappings.len(),
            removed = report.removed_records,
            deleted = report.deleted_objects,
            failed = report.failed_objects,
            "share_assets_removed"
        );
        Ok(report)
    }
}
