use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use crate::application::ports::blob_source::BlobSource;

/// Resolves document-relative references under a workspace root. Rooted and
/// parent-escaping references are rejected outright.
pub struct FsBlobSource {
    root: PathBuf,
    max_bytes: u64,
}

impl FsBlobSource {
    pub fn new(root: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    fn resolve(&self, local_path: &str) -> anyhow::Result<PathBuf> {
        let mut relative = PathBuf::new();
        for component in Path::new(local_path).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => continue,
                _ => anyhow::bail!("forbidden"),
            }
        }
        if relative.as_os_str().is_empty() {
            anyhow::bail!("forbidden");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobSource for FsBlobSource {
    async fn fetch(&self, local_path: &str) -> anyhow::Result<Vec<u8>> {
        let path = self.resolve(local_path)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("missing local asset {local_path}"))?;
        if metadata.len() > self.max_bytes {
            anyhow::bail!(
                "asset {local_path} exceeds the {} byte upload limit",
                self.max_bytes
            );
        }
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("read local asset {local_path}"))
    }
}
