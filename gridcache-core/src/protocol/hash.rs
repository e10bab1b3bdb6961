//! Hash functions used for routing and cache naming.

/// Computes the partition hash for the given affinity key bytes.
///
/// Uses the 32-bit x86 MurmurHash3 variant, so every client and node agrees on
/// the partition of a key.
pub fn partition_hash(key: &[u8]) -> i32 {
    murmur_hash3_x86_32(key, 0x0100_0193)
}

/// Returns the partition index of `key` in a table of `partition_count`
/// partitions.
///
/// The result is always in `[0, partition_count)`. Returns `None` when the
/// partition count is not positive.
pub fn partition_for(key: &[u8], partition_count: i32) -> Option<i32> {
    if partition_count <= 0 {
        return None;
    }
    Some(partition_hash(key).rem_euclid(partition_count))
}

/// Derives the numeric id of a cache from its name.
///
/// Names are case-insensitive: the id is the 31-multiplier string hash of the
/// lower-cased name taken over UTF-16 code units.
pub fn cache_id(name: &str) -> i32 {
    name.to_lowercase()
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

fn murmur_hash3_x86_32(data: &[u8], seed: u32) -> i32 {
    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;

    let len = data.len();
    let mut h1 = seed;

    let mut blocks = data.chunks_exact(4);
    for block in &mut blocks {
        let mut k1 = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        k1 = k1.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);

        h1 ^= k1;
        h1 = h1.rotate_left(13);
        h1 = h1.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let mut k1: u32 = 0;
        for (i, byte) in tail.iter().enumerate() {
            k1 ^= u32::from(*byte) << (8 * i);
        }
        k1 = k1.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= len as u32;
    h1 ^= h1 >> 16;
    h1 = h1.wrapping_mul(0x85eb_ca6b);
    h1 ^= h1 >> 13;
    h1 = h1.wrapping_mul(0xc2b2_ae35);
    h1 ^= h1 >> 16;

    h1 as i32
}
