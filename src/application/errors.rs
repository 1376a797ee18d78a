/// Per-file failure taxonomy for the sync pipeline. One file's error is
/// attached to that file's result and never aborts sibling files.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    /// Missing or incomplete credentials. Fatal before any network attempt.
    #[error("storage configuration incomplete: missing {0}")]
    Configuration(&'static str),
    #[error("failed to compute request signature")]
    Signing(#[source] anyhow::Error),
    /// Direct transport failed and the relay path failed or was unavailable.
    #[error("transport failed")]
    Transport(#[source] anyhow::Error),
    /// The endpoint answered with a non-2xx status. Not retried automatically.
    #[error("remote rejected the request with status {status}")]
    RemoteRejected { status: u16, body: String },
    #[error("failed to read local asset")]
    Blob(#[source] anyhow::Error),
    #[error("asset index unavailable")]
    Index(#[source] anyhow::Error),
    /// Explicit cancellation. A terminal status, not a defect.
    #[error("operation cancelled")]
    Cancelled,
}
