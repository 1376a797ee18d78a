use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::application::dto::sync::SyncEvent;
use crate::application::ports::asset_index::AssetIndexRepository;
use crate::application::ports::blob_source::BlobSource;
use crate::application::ports::object_transport::ObjectTransport;
use crate::application::ports::relay_uploader::RelayUploader;
use crate::bootstrap::config::Config;
use crate::infrastructure::blobs::fs_blob_source::FsBlobSource;
use crate::infrastructure::index::json_asset_index::JsonAssetIndex;
use crate::infrastructure::transport::http_relay::HttpRelayUploader;
use crate::infrastructure::transport::reqwest_transport::ReqwestObjectTransport;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

pub struct AppServices {
    asset_index: Arc<dyn AssetIndexRepository>,
    transport: Arc<dyn ObjectTransport>,
    relay: Option<Arc<dyn RelayUploader>>,
    blobs: Arc<dyn BlobSource>,
    sync_events: broadcast::Sender<SyncEvent>,
}

impl AppServices {
    pub fn new(
        asset_index: Arc<dyn AssetIndexRepository>,
        transport: Arc<dyn ObjectTransport>,
        relay: Option<Arc<dyn RelayUploader>>,
        blobs: Arc<dyn BlobSource>,
        sync_events: broadcast::Sender<SyncEvent>,
    ) -> Self {
        Self {
            asset_index,
            transport,
            relay,
            blobs,
            sync_events,
        }
    }
}

impl AppContext {
    /// Default wiring: JSON index at the configured path, direct reqwest
    /// transport, filesystem blobs under the workspace root, and the HTTP
    /// relay when one is configured.
    pub async fn new(cfg: Config) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(cfg.upload_timeout_secs);

        let asset_index: Arc<dyn AssetIndexRepository> =
            Arc::new(JsonAssetIndex::open(&cfg.index_path).await?);
        let transport: Arc<dyn ObjectTransport> = Arc::new(ReqwestObjectTransport::new(timeout)?);
        let relay: Option<Arc<dyn RelayUploader>> =
            match (&cfg.relay_endpoint, &cfg.relay_token) {
                (Some(endpoint), Some(token)) => {
                    let relay =
                        HttpRelayUploader::new(endpoint.clone(), token.clone(), timeout)?;
                    Some(Arc::new(relay) as Arc<dyn RelayUploader>)
                }
                _ => None,
            };
        let blobs: Arc<dyn BlobSource> =
            Arc::new(FsBlobSource::new(&cfg.workspace_dir, cfg.upload_max_bytes));
        let (sync_events, _) = broadcast::channel(256);

        let services = AppServices::new(asset_index, transport, relay, blobs, sync_events);
        Ok(Self {
            cfg,
            services: Arc::new(services),
        })
    }

    /// Hosts that bring their own adapters (e.g. a non-filesystem blob
    /// source) wire them here.
    pub fn with_services(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn asset_index(&self) -> Arc<dyn AssetIndexRepository> {
        self.services.asset_index.clone()
    }

    pub fn transport(&self) -> Arc<dyn ObjectTransport> {
        self.services.transport.clone()
    }

    pub fn relay(&self) -> Option<Arc<dyn RelayUploader>> {
        self.services.relay.clone()
    }

    pub fn blobs(&self) -> Arc<dyn BlobSource> {
        self.services.blobs.clone()
    }

    pub fn sync_events(&self) -> &broadcast::Sender<SyncEvent> {
        &self.services.sync_events
    }

    pub fn subscribe_sync_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.services.sync_events.subscribe()
    }
}
