use sha2::{Digest, Sha256};

/// SHA-256 of the exact bytes written for a cached document.
/// Stored in the metadata so a load can tell whether the two files belong together.
pub fn document_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
