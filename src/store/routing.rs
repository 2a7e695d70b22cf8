//! Key Routing
//!
//! Maps keys to shards with 32-bit FNV-1a. The mapping is pure, so a key
//! always lands on the same shard for a given shard count.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a hash of `bytes`.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Index of the shard owning `key` among `shard_count` shards.
///
/// `shard_count` must be non-zero.
pub fn shard_index(key: &str, shard_count: usize) -> usize {
    fnv1a_32(key.as_bytes()) as usize % shard_count
}
