use serde::{Deserialize, Serialize};

/// Which request-signing protocol the storage endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// SigV4-style canonical-request signature.
    S3,
    /// Legacy single-HMAC signature.
    Oss,
}

/// Endpoint and credential set for one storage target. Treated as a value
/// passed into signing and transport per call, never mutated mid-operation.
#[derive(Debug, Clone)]
pub struct StorageProfile {
    pub provider: StorageProvider,
    /// Bare endpoint host, e.g. `s3.example.com`.
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Key prefix for uploaded objects, without surrounding slashes.
    pub path_prefix: String,
    /// Overrides the derived endpoint URL for public links when set.
    pub custom_domain: Option<String>,
}

impl StorageProfile {
    /// First credential field that is missing, if any.
    pub fn incomplete_field(&self) -> Option<&'static str> {
        if self.endpoint.trim().is_empty() {
            Some("endpoint")
        } else if self.bucket.trim().is_empty() {
            Some("bucket")
        } else if self.region.trim().is_empty() {
            Some("region")
        } else if self.access_key_id.trim().is_empty() {
            Some("access_key_id")
        } else if self.secret_access_key.trim().is_empty() {
            Some("secret_access_key")
        } else {
            None
        }
    }

    /// Virtual-hosted host the signature must cover, `{bucket}.{endpoint}`.
    pub fn host(&self) -> String {
        format!("{}.{}", self.bucket, self.endpoint)
    }

    /// URL the PUT/DELETE request is issued against.
    pub fn object_url(&self, key: &str) -> String {
        format!("https://{}/{}", self.host(), key.trim_start_matches('/'))
    }

    /// Externally resolvable URL for an uploaded object.
    pub fn public_url(&self, key: &str) -> String {
        match self.custom_domain.as_deref() {
            Some(domain) if !domain.trim().is_empty() => {
                let domain = domain.trim().trim_end_matches('/');
                if domain.starts_with("http://") || domain.starts_with("https://") {
                    format!("{}/{}", domain, key.trim_start_matches('/'))
                } else {
                    format!("https://{}/{}", domain, key.trim_start_matches('/'))
                }
            }
            _ => self.object_url(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> StorageProfile {
        StorageProfile {
            provider: StorageProvider::S3,
            endpoint: "s3.example.com".into(),
            bucket: "b".into(),
            region: "us-east-1".into(),
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "secret".into(),
            path_prefix: "p".into(),
            custom_domain: None,
        }
    }

    #[test]
    fn object_url_is_virtual_hosted() {
        assert_eq!(
            profile().object_url("p/123-abc.png"),
            "https://b.s3.example.com/p/123-abc.png"
        );
    }

    #[test]
    fn public_url_prefers_custom_domain() {
        let mut p = profile();
        p.custom_domain = Some("cdn.example.net/".into());
        assert_eq!(
            p.public_url("p/123-abc.png"),
            "https://cdn.example.net/p/123-abc.png"
        );
        p.custom_domain = Some("http://cdn.example.net".into());
        assert_eq!(
            p.public_url("p/123-abc.png"),
            "http://cdn.example.net/p/123-abc.png"
        );
    }

    #[test]
    fn incomplete_field_reports_first_gap() {
        let mut p = profile();
        assert_eq!(p.incomplete_field(), None);
        p.secret_access_key = String::new();
        assert_eq!(p.incomplete_field(), Some("secret_access_key"));
        p.bucket = "  ".into();
        assert_eq!(p.incomplete_field(), Some("bucket"));
    }
}
