use sha2::{Digest, Sha256};

/// 16 hex chars keeps object keys short; size must be compared separately
/// before two blobs are treated as identical content.
pub const FINGERPRINT_LEN: usize = 16;

/// Stable content fingerprint: the leading hex of a SHA-256 digest over the
/// full byte content.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = format!("{:x}", hasher.finalize());
    digest[..FINGERPRINT_LEN].to_string()
}
