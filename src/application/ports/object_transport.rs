use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

/// Invoked with `(bytes_sent, bytes_total)` as the body is handed to the wire.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum TransportFailure {
    /// No HTTP response was obtained. The only failure class eligible for the
    /// relay fallback.
    #[error("endpoint unreachable")]
    Unreachable(#[source] anyhow::Error),
    /// The endpoint answered with a definitive non-2xx status.
    #[error("remote returned status {status}")]
    Rejected { status: u16, body: String },
    #[error("cancelled")]
    Cancelled,
}

/// Direct HTTP path against the storage endpoint. Headers arrive fully signed;
/// the transport contributes nothing to the signature beyond the Host the URL
/// already implies.
#[async_trait]
pub trait ObjectTransport: Send + Sync {
    async fn put(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Bytes,
        progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> Result<(), TransportFailure>;

    /// Deleting an object that is already gone is a success.
    async fn delete(
        &self,
        url: &str,
        headers: &[(String, String)],
        cancel: &CancellationToken,
    ) -> Result<(), TransportFailure>;
}
