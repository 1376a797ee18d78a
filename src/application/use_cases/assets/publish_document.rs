use tokio::sync::broadcast;

use crate::application::dto::sync::{SyncEvent, SyncReport, SyncRequest};
use crate::application::ports::asset_index::AssetIndexRepository;
use crate::application::ports::blob_source::BlobSource;
use crate::application::ports::object_transport::ObjectTransport;
use crate::application::ports::relay_uploader::RelayUploader;
use crate::application::services::rewrite;
use crate::application::use_cases::assets::sync_assets::SyncAssets;
use crate::domain::storage::StorageProfile;

/// Hand-off shape for the publishing side: the document text with every local
/// reference rewritten, plus the records backing it.
#[derive(Debug)]
pub struct PublishedDocument {
    pub text: String,
    pub report: SyncReport,
}

/// Synchronizes a document's assets and rewrites its text in one step. Files
/// that failed keep their local references so the caller can decide whether a
/// partial publish is acceptable.
pub struct PublishDocument<'a, I, T, B>
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

impl<'a, I, T, B> PublishDocument<'a, I, T, B>
where
    I: AssetIndexRepository + ?Sized,
    T: ObjectTransport + ?Sized,
    B: BlobSource + ?Sized,
{
    pub async fn execute(&self, req: SyncRequest, text: &str) -> anyhow::Result<PublishedDocument> {
        let report = SyncAssets {
            index: self.index,
            transport: self.transport,
            blobs: self.blobs,
            relay: self.relay,
            profile: self.profile,
            events: self.events,
        }
        .execute(req)
        .await?;

        let text = rewrite::rewrite_references(text, &report.records);
        Ok(PublishedDocument { text, report })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::application::dto::sync::SyncItem;
    use crate::application::ports::object_transport::{ProgressFn, TransportFailure};
    use crate::domain::storage::StorageProvider;
    use crate::infrastructure::index::json_asset_index::JsonAssetIndex;

    struct MemoryBlobs(HashMap<String, Vec<u8>>);

    #[async_trait]
    impl BlobSource for MemoryBlobs {
        async fn fetch(&self, local_path: &str) -> anyhow::Result<Vec<u8>> {
            self.0
                .get(local_path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("missing blob {local_path}"))
        }
    }

    #[derive(Default)]
    struct OkTransport {
        puts: Mutex<usize>,
    }

    #[async_trait]
    impl ObjectTransport for OkTransport {
        async fn put(
            &self,
            _url: &str,
            _headers: &[(String, String)],
            _body: Bytes,
            _progress: ProgressFn,
            _cancel: &CancellationToken,
        ) -> Result<(), TransportFailure> {
            *self.puts.lock().unwrap() += 1;
            Ok(())
        }

        async fn delete(
            &self,
            _url: &str,
            _headers: &[(String, String)],
            _cancel: &CancellationToken,
        ) -> Result<(), TransportFailure> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn rewrites_every_reference_form() {
        let dir = TempDir::new().unwrap();
        let index = JsonAssetIndex::open(dir.path().join("index.json"))
            .await
            .unwrap();
        let transport = OkTransport::default();
        let blobs = MemoryBlobs(HashMap::from([(
            "assets/logo.png".to_string(),
            b"logo-bytes".to_vec(),
        )]));
        let profile = StorageProfile {
            provider: StorageProvider::S3,
            endpoint: "s3.example.com".into(),
            bucket: "b".into(),
            region: "us-east-1".into(),
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "secret".into(),
            path_prefix: "p".into(),
            custom_domain: None,
        };
        let (tx, _rx) = broadcast::channel(64);

        let text = "![logo](assets/logo.png)\n[download](assets/logo.png)\nassets/logo.png";
        let published = PublishDocument {
            index: &index,
            transport: &transport,
            blobs: &blobs,
            relay: None,
            profile: &profile,
            events: &tx,
        }
        .execute(
            SyncRequest {
                document_id: "doc-1".into(),
                share_id: "share-1".into(),
                items: vec![SyncItem::new("assets/logo.png")],
                reuse_by_hash: true,
                cancel: CancellationToken::new(),
            },
            text,
        )
        .await
        .unwrap();

        assert_eq!(*transport.puts.lock().unwrap(), 1);
        let url = &published.report.records[0].remote_url;
        assert_eq!(
            published.text,
            format!("![logo]({url})\n[download]({url})\n{url}")
        );
        assert!(!published.text.contains("assets/logo.png"));
    }
}
