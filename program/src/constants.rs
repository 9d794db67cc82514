//! PDA seeds and fixed code-image formats.
//!
//! Clients deriving addresses off-chain must use exactly these values.

/// Config PDA: ["config"]
pub const SEED_CONFIG: &[u8] = b"config";

/// Counters PDA: ["counters"]
pub const SEED_COUNTERS: &[u8] = b"counters";

/// Instance PDA: ["instance", final_salt, code_hash]
pub const SEED_INSTANCE: &[u8] = b"instance";

/// Blueprint record: ["blueprint", id (u64 le)]
pub const SEED_BLUEPRINT: &[u8] = b"blueprint";
/// Content hash claim: ["hash", content_hash]
pub const SEED_HASH: &[u8] = b"hash";
/// Ids by category: ["category", category as u8]
pub const SEED_CATEGORY: &[u8] = b"category";
/// Ids by author: ["author", author]
pub const SEED_AUTHOR: &[u8] = b"author";
/// Proxy target of a blueprint: ["binding", id (u64 le)]
pub const SEED_BINDING: &[u8] = b"binding";
/// Instance record: ["record", instance address]
pub const SEED_RECORD: &[u8] = b"record";
/// Instances by creator: ["creator", creator]
pub const SEED_CREATOR: &[u8] = b"creator";
/// Instances by blueprint: ["deployed", id (u64 le)]
pub const SEED_DEPLOYED: &[u8] = b"deployed";
/// Every instance in creation order: ["ledger"]
pub const SEED_LEDGER: &[u8] = b"ledger";

/// Minimal-proxy image: magic ‖ version ‖ 3 reserved bytes ‖ implementation.
pub const PROXY_MAGIC: &[u8; 4] = b"BPXY";
pub const PROXY_VERSION: u8 = 1;
pub const PROXY_IMAGE_LEN: usize = 4 + 1 + 3 + 32;

/// Blueprint id 0 means "no blueprint" (direct instances).
pub const NO_BLUEPRINT: u64 = 0;
