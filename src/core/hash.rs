//! Client Identity Hashing
//!
//! Newmod clients report a cuid (client unique id, two 32-bit halves printed
//! as `"hi-lo"`). Session state keeps only a 64-bit digest of it.

use sha1::{Digest, Sha1};

/// 64-bit digest of a client's cuid. Zero means "no cuid".
pub type CuidHash = u64;

/// The cuid every unpatched client reports.
pub const DEFAULT_CUID: &str = "0-0";

/// Hash a cuid.
///
/// Empty and default cuids hash to 0. Otherwise the result is the first
/// 64 bits of the SHA-1 digest, big-endian, so hashes match those logged by
/// existing servers. The cuid itself carries 64 bits.
pub fn hash_cuid(cuid: &str) -> CuidHash {
    if cuid.is_empty() || cuid == DEFAULT_CUID {
        return 0;
    }

    let digest = Sha1::digest(cuid.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Uppercase hex rendering used in log lines.
pub fn format_cuid_hash(hash: CuidHash) -> String {
    hex::encode_upper(hash.to_be_bytes())
}

// =============================================================================
// TESTS
// =============================================================================
