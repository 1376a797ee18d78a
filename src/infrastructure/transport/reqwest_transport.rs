use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::application::ports::object_transport::{ObjectTransport, ProgressFn, TransportFailure};

const BODY_CHUNK_BYTES: usize = 64 * 1024;
const ERROR_BODY_LIMIT: usize = 4 * 1024;

/// Direct HTTP path. The body is streamed in fixed chunks so progress can be
/// reported as the transport pulls them; an explicit Content-Length is set
/// because the signature scheme runs in unsigned-payload mode and the server
/// still needs the length up front.
pub struct ReqwestObjectTransport {
    client: reqwest::Client,
}

impl ReqwestObjectTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }

    fn apply_headers(
        mut request: reqwest::RequestBuilder,
        headers: &[(String, String)],
    ) -> reqwest::RequestBuilder {
        for (name, value) in headers {
            request = request.header(name, value);
        }
        request
    }
}

fn chunked(body: &Bytes) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(body.len() / BODY_CHUNK_BYTES + 1);
    let mut rest = body.clone();
    while rest.len() > BODY_CHUNK_BYTES {
        chunks.push(rest.split_to(BODY_CHUNK_BYTES));
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

async fn read_error_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(text) if text.len() > ERROR_BODY_LIMIT => {
            text.chars().take(ERROR_BODY_LIMIT).collect()
        }
        Ok(text) => text,
        Err(_) => String::new(),
    }
}

#[async_trait]
impl ObjectTransport for ReqwestObjectTransport {
    async fn put(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Bytes,
        progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> Result<(), TransportFailure> {
        let total = body.len() as u64;
        let sent = Arc::new(AtomicU64::new(0));
        let counter = sent.clone();
        let on_chunk = progress.clone();
        let stream = futures_util::stream::iter(chunked(&body).into_iter().map(move |chunk| {
            let so_far = counter.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
            on_chunk(so_far, total);
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let request = Self::apply_headers(self.client.put(url), headers)
            .header(reqwest::header::CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(stream));

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(TransportFailure::Cancelled),
            result = request.send() => {
                result.map_err(|err| TransportFailure::Unreachable(anyhow::Error::new(err)))?
            }
        };

        let status = response.status();
        if status.is_success() {
            progress(total, total);
            return Ok(());
        }
        Err(TransportFailure::Rejected {
            status: status.as_u16(),
            body: read_error_body(response).await,
        })
    }

    async fn delete(
        &self,
        url: &str,
        headers: &[(String, String)],
        cancel: &CancellationToken,
    ) -> Result<(), TransportFailure> {
        let request = Self::apply_headers(self.client.delete(url), headers);
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(TransportFailure::Cancelled),
            result = request.send() => {
                result.map_err(|err| TransportFailure::Unreachable(anyhow::Error::new(err)))?
            }
        };

        let status = response.status();
        // deleting an object that is already gone is a success
        if status.is_success() || status.as_u16() == 404 {
            return Ok(());
        }
        Err(TransportFailure::Rejected {
            status: status.as_u16(),
            body: read_error_body(response).await,
        })
    }
}
