//! Core primitives.
//!
//! Address parsing, the host clock, and client identity hashing. Shared by
//! the recorder and the session snapshot store.

pub mod address;
pub mod clock;
pub mod hash;

// Re-export core types
pub use address::{parse_ipv4, Endpoint, MaskedAddress};
pub use clock::{Clock, ManualClock, SystemClock};
pub use hash::{format_cuid_hash, hash_cuid, CuidHash};
