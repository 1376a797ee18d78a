use async_trait::async_trait;

/// Resolves a document-relative reference to its raw bytes. Supplied by the
/// document collaborator alongside the extracted references.
#[async_trait]
pub trait BlobSource: Send + Sync {
    async fn fetch(&self, local_path: &str) -> anyhow::Result<Vec<u8>>;
}
