use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::domain::storage::{StorageProfile, StorageProvider};

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

/// Sentinel meaning the payload was not pre-hashed. Content length is never
/// signed either; the server does not verify payload integrity through the
/// signature in exchange for streaming-friendly uploads.
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
const V4_ALGORITHM: &str = "AWS4-HMAC-SHA256";
const V4_SERVICE: &str = "s3";
const V4_SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";
const OSS_SCHEME: &str = "OSS";

/// Header set (including `Authorization`) for one storage request. Pure over
/// its inputs; the timestamp is explicit so a signature is reproducible.
///
/// The canonical block covers `host` even though the HTTP layer supplies that
/// header itself; the transport derives the same host from the request URL.
pub fn sign(
    profile: &StorageProfile,
    method: &str,
    key: &str,
    content_type: &str,
    at: DateTime<Utc>,
) -> anyhow::Result<Vec<(String, String)>> {
    match profile.provider {
        StorageProvider::S3 => sign_v4(profile, method, key, content_type, at),
        StorageProvider::Oss => sign_simple(profile, method, key, content_type, at),
    }
}

/// Canonical-request signature: hash the canonical request, wrap it in a
/// string-to-sign scoped to `date/region/s3/aws4_request`, and sign with a
/// key derived by chaining four HMAC operations off the secret.
fn sign_v4(
    profile: &StorageProfile,
    method: &str,
    key: &str,
    content_type: &str,
    at: DateTime<Utc>,
) -> anyhow::Result<Vec<(String, String)>> {
    let amz_date = at.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = at.format("%Y%m%d").to_string();
    let host = profile.host();

    let canonical_uri = format!("/{}", encode_key(key));
    let canonical_headers = format!(
        "host:{host}\nx-amz-content-sha256:{UNSIGNED_PAYLOAD}\nx-amz-date:{amz_date}\n"
    );
    let canonical_request = format!(
        "{method}\n{canonical_uri}\n\n{canonical_headers}\n{V4_SIGNED_HEADERS}\n{UNSIGNED_PAYLOAD}"
    );

    let scope = format!("{date_stamp}/{}/{V4_SERVICE}/aws4_request", profile.region);
    let string_to_sign = format!(
        "{V4_ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(&profile.secret_access_key, &date_stamp, &profile.region)?;
    let signature = hex(&hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

    let authorization = format!(
        "{V4_ALGORITHM} Credential={}/{scope}, SignedHeaders={V4_SIGNED_HEADERS}, Signature={signature}",
        profile.access_key_id
    );

    let mut headers = Vec::with_capacity(4);
    if !content_type.is_empty() {
        headers.push(("Content-Type".to_string(), content_type.to_string()));
    }
    headers.push(("x-amz-date".to_string(), amz_date));
    headers.push((
        "x-amz-content-sha256".to_string(),
        UNSIGNED_PAYLOAD.to_string(),
    ));
    headers.push(("Authorization".to_string(), authorization));
    Ok(headers)
}

/// Legacy single-HMAC signature over
/// `method\n\ncontent-type\nrfc1123-date\n/bucket/key`, base64-encoded.
fn sign_simple(
    profile: &StorageProfile,
    method: &str,
    key: &str,
    content_type: &str,
    at: DateTime<Utc>,
) -> anyhow::Result<Vec<(String, String)>> {
    let date = at.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
    let resource = format!("/{}/{}", profile.bucket, key.trim_start_matches('/'));
    let string_to_sign = format!("{method}\n\n{content_type}\n{date}\n{resource}");

    let mut mac = HmacSha1::new_from_slice(profile.secret_access_key.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid signing key: {e}"))?;
    mac.update(string_to_sign.as_bytes());
    let signature =
        base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    let authorization = format!("{OSS_SCHEME} {}:{signature}", profile.access_key_id);

    let mut headers = Vec::with_capacity(3);
    headers.push(("Date".to_string(), date));
    if !content_type.is_empty() {
        headers.push(("Content-Type".to_string(), content_type.to_string()));
    }
    headers.push(("Authorization".to_string(), authorization));
    Ok(headers)
}

/// Percent-encode each path segment independently, preserving `/` separators.
fn encode_key(key: &str) -> String {
    key.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// `HMAC(date, "AWS4" + secret)` → region → service → `"aws4_request"`.
fn derive_signing_key(secret: &str, date_stamp: &str, region: &str) -> anyhow::Result<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, V4_SERVICE.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| anyhow::anyhow!("invalid signing key: {e}"))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile(provider: StorageProvider) -> StorageProfile {
        StorageProfile {
            provider,
            endpoint: "s3.example.com".into(),
            bucket: "b".into(),
            region: "us-east-1".into(),
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".into(),
            path_prefix: "p".into(),
            custom_domain: None,
        }
    }

    fn fixed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> &'a str {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn v4_signature_is_reproducible() {
        let p = profile(StorageProvider::S3);
        let a = sign(&p, "PUT", "p/123-abc.png", "image/png", fixed_at()).unwrap();
        let b = sign(&p, "PUT", "p/123-abc.png", "image/png", fixed_at()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn v4_authorization_carries_scope_and_hex_signature() {
        let p = profile(StorageProvider::S3);
        let headers = sign(&p, "PUT", "p/123-abc.png", "image/png", fixed_at()).unwrap();
        let auth = header(&headers, "Authorization");
        assert!(auth.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240501/us-east-1/s3/aws4_request, \
             SignedHeaders=host;x-amz-content-sha256;x-amz-date, Signature="
        ));
        let signature = auth.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(header(&headers, "x-amz-date"), "20240501T120000Z");
        assert_eq!(header(&headers, "x-amz-content-sha256"), "UNSIGNED-PAYLOAD");
        assert_eq!(header(&headers, "Content-Type"), "image/png");
    }

    #[test]
    fn v4_signature_depends_on_secret_and_key() {
        let p = profile(StorageProvider::S3);
        let mut other = profile(StorageProvider::S3);
        other.secret_access_key = "different".into();
        let a = sign(&p, "PUT", "p/123-abc.png", "image/png", fixed_at()).unwrap();
        let b = sign(&other, "PUT", "p/123-abc.png", "image/png", fixed_at()).unwrap();
        assert_ne!(header(&a, "Authorization"), header(&b, "Authorization"));

        let c = sign(&p, "PUT", "p/123-other.png", "image/png", fixed_at()).unwrap();
        assert_ne!(header(&a, "Authorization"), header(&c, "Authorization"));
    }

    #[test]
    fn v4_delete_omits_content_type() {
        let p = profile(StorageProvider::S3);
        let headers = sign(&p, "DELETE", "p/123-abc.png", "", fixed_at()).unwrap();
        assert!(!headers.iter().any(|(k, _)| k == "Content-Type"));
    }

    #[test]
    fn key_segments_encode_independently() {
        assert_eq!(encode_key("p/my file.png"), "p/my%20file.png");
        assert_eq!(encode_key("/p/a+b.png"), "p/a%2Bb.png");
        assert_eq!(encode_key("plain/ascii-key_1.png"), "plain/ascii-key_1.png");
    }

    #[test]
    fn simple_signature_shape() {
        let p = profile(StorageProvider::Oss);
        let headers = sign(&p, "PUT", "p/123-abc.png", "image/png", fixed_at()).unwrap();
        assert_eq!(header(&headers, "Date"), "Wed, 01 May 2024 12:00:00 GMT");
        let auth = header(&headers, "Authorization");
        assert!(auth.starts_with("OSS AKIDEXAMPLE:"));
        let sig = auth.rsplit(':').next().unwrap();
        let raw = base64::engine::general_purpose::STANDARD
            .decode(sig)
            .unwrap();
        assert_eq!(raw.len(), 20); // HMAC-SHA1 digest
    }

    #[test]
    fn simple_signature_is_reproducible() {
        let p = profile(StorageProvider::Oss);
        let a = sign(&p, "DELETE", "p/123-abc.png", "", fixed_at()).unwrap();
        let b = sign(&p, "DELETE", "p/123-abc.png", "", fixed_at()).unwrap();
        assert_eq!(a, b);
    }
}
