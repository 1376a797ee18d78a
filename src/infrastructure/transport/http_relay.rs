use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

use crate::application::ports::relay_uploader::{RelayRequest, RelayUploader};

/// Multiple of 3 so chunk boundaries never introduce base64 padding
/// mid-stream.
const ENCODE_CHUNK_BYTES: usize = 3 * 64 * 1024;

/// Trusted intermediary client. The relay replays the signed request
/// server-side and answers with a `{code, msg}` envelope; zero is success.
pub struct HttpRelayUploader {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct RelayEnvelope {
    code: i64,
    #[serde(default)]
    msg: String,
}

impl HttpRelayUploader {
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build relay client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }
}

/// Encode fixed-size slices one at a time to bound peak memory instead of
/// materializing a second full copy of the payload.
fn encode_chunked(payload: &[u8]) -> String {
    let mut out = String::with_capacity(payload.len().div_ceil(3) * 4);
    for chunk in payload.chunks(ENCODE_CHUNK_BYTES) {
        base64::engine::general_purpose::STANDARD.encode_string(chunk, &mut out);
    }
    out
}

#[async_trait]
impl RelayUploader for HttpRelayUploader {
    async fn forward(&self, request: RelayRequest<'_>) -> anyhow::Result<()> {
        let headers: serde_json::Map<String, serde_json::Value> = request
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        let body = serde_json::json!({
            "url": request.url,
            "method": request.method,
            "headers": headers,
            "payload": encode_chunked(request.payload),
            "meta": {
                "localPath": request.local_path,
                "contentType": request.content_type,
                "size": request.payload.len(),
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("relay request failed: {e}"))?;
        if !response.status().is_success() {
            anyhow::bail!("relay returned status {}", response.status());
        }
        let envelope: RelayEnvelope = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("failed to read relay verdict: {e}"))?;
        if envelope.code != 0 {
            anyhow::bail!("relay rejected upload: {}", envelope.msg);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_encoding_matches_single_shot() {
        for len in [0usize, 1, 2, 3, ENCODE_CHUNK_BYTES - 1, ENCODE_CHUNK_BYTES, 200_000] {
            let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            assert_eq!(
                encode_chunked(&payload),
                base64::engine::general_purpose::STANDARD.encode(&payload),
                "len {len}"
            );
        }
    }

    #[test]
    fn envelope_defaults_missing_msg() {
        let env: RelayEnvelope = serde_json::from_str(r#"{"code": 0}"#).unwrap();
        assert_eq!(env.code, 0);
        assert!(env.msg.is_empty());

        let env: RelayEnvelope =
            serde_json::from_str(r#"{"code": 1, "msg": "denied"}"#).unwrap();
        assert_eq!(env.code, 1);
        assert_eq!(env.msg, "denied");
    }
}
