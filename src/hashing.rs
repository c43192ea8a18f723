//! Hashing - SHA-256 Digests for Build Reports
//!
//! Lets a caller tell whether two exports fed the toolchain identical source.

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}
