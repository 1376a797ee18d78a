use async_trait::async_trait;

/// What the trusted intermediary needs to replay the signed request
/// server-side.
#[derive(Debug)]
pub struct RelayRequest<'a> {
    pub url: &'a str,
    pub method: &'a str,
    pub headers: &'a [(String, String)],
    pub payload: &'a [u8],
    pub local_path: &'a str,
    pub content_type: &'a str,
}

/// Optional collaborator used once per file when the direct transport fails
/// without an HTTP response. Never retried and never invoked after
/// cancellation.
#[async_trait]
pub trait RelayUploader: Send + Sync {
    async fn forward(&self, request: RelayRequest<'_>) -> anyhow::Result<()>;
}
