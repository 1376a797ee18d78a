use std::env;

use crate::domain::storage::{StorageProfile, StorageProvider};

#[derive(Clone, Debug)]
pub struct Config {
    pub provider: StorageProvider,
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub path_prefix: String,
    pub custom_domain: Option<String>,
    pub relay_endpoint: Option<String>,
    pub relay_token: Option<String>,
    pub index_path: String,
    pub workspace_dir: String,
    pub upload_timeout_secs: u64,
    pub upload_max_bytes: u64,
    pub reuse_by_hash: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let provider = match env::var("STORAGE_PROVIDER")
            .unwrap_or_else(|_| "s3".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "s3" => StorageProvider::S3,
            "oss" => StorageProvider::Oss,
            other => anyhow::bail!("unknown STORAGE_PROVIDER {other:?} (expected s3 or oss)"),
        };
        let endpoint = env::var("STORAGE_ENDPOINT").unwrap_or_default();
        let bucket = env::var("STORAGE_BUCKET").unwrap_or_default();
        let region = env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".into());
        let access_key_id = env::var("STORAGE_ACCESS_KEY_ID").unwrap_or_default();
        let secret_access_key = env::var("STORAGE_SECRET_KEY").unwrap_or_default();
        let path_prefix = env::var("STORAGE_PATH_PREFIX").unwrap_or_else(|_| "assets".into());
        let custom_domain = env::var("STORAGE_CUSTOM_DOMAIN")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let relay_endpoint = env::var("RELAY_ENDPOINT")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let relay_token = env::var("RELAY_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let index_path = env::var("INDEX_PATH").unwrap_or_else(|_| "./asset-index.json".into());
        let workspace_dir = env::var("WORKSPACE_DIR").unwrap_or_else(|_| ".".into());
        let upload_timeout_secs = env::var("UPLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        let upload_max_bytes = env::var("UPLOAD_MAX_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(25 * 1024 * 1024);
        let reuse_by_hash = env::var("REUSE_BY_HASH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(true);

        if relay_endpoint.is_some() && relay_token.is_none() {
            anyhow::bail!("RELAY_TOKEN must be set when RELAY_ENDPOINT is configured");
        }

        Ok(Self {
            provider,
            endpoint,
            bucket,
            region,
            access_key_id,
            secret_access_key,
            path_prefix,
            custom_domain,
            relay_endpoint,
            relay_token,
            index_path,
            workspace_dir,
            upload_timeout_secs,
            upload_max_bytes,
            reuse_by_hash,
        })
    }

    /// Per-operation signing/transport input. Completeness is checked at use
    /// time, before any network attempt.
    pub fn storage_profile(&self) -> StorageProfile {
        StorageProfile {
            provider: self.provider,
            endpoint: self.endpoint.clone(),
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            path_prefix: self.path_prefix.clone(),
            custom_domain: self.custom_domain.clone(),
        }
    }
}
