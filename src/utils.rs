//! Small helpers shared across `monotree`'s modules: random byte/hash
//! generation for tests and demos, a fixed-length conversion for hasher
//! output, and a Fisher-Yates shuffle used by property-style tests that
//! check insertion order independence.
use crate::{Hash, HASH_LEN};

/// Converts a hash digest into a fixed-width [`Hash`].
///
/// Every [`Hasher`](crate::Hasher) impl in this crate is pinned to emit
/// exactly `HASH_LEN` bytes, so this is infallible in practice; it panics
/// rather than silently truncating or padding if that invariant is ever
/// violated by a new hasher impl.
pub fn slice_to_hash(bytes: &[u8]) -> Hash {
    let mut hash = [0u8; HASH_LEN];
    hash.copy_from_slice(bytes);
    hash
}

/// Draws `n` uniformly random bytes.
pub fn random_bytes(n: usize) -> Vec<u8> {
    (0..n).map(|_| rand::random::<u8>()).collect()
}

/// Draws a uniformly random, `HASH_LEN`-byte [`Hash`].
pub fn random_hash() -> Hash {
    slice_to_hash(&random_bytes(HASH_LEN))
}

/// Draws `n` uniformly random, independent [`Hash`] values.
pub fn random_hashes(n: usize) -> Vec<Hash> {
    (0..n).map(|_| random_hash()).collect()
}

/// Shuffles `slice` in place (Fisher-Yates), used by tests that check a
/// Monotree's root hash is independent of insertion order.
pub fn shuffle<T>(slice: &mut [T]) {
    for i in (1..slice.len()).rev() {
        let j = rand::random::<usize>() % (i + 1);
        slice.swap(i, j);
    }
}

/// Hex-encodes `bytes`, handy for naming scratch on-disk database
/// directories in tests and demos.
pub fn hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Splits `items` into chunks of at most `size`, used by batch insert to
/// turn an arbitrarily long key/leaf sequence into bounded-size
/// `prepare`/`commit` groups (spec §4.3.5).
pub fn chunks<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return vec![items.to_vec()];
    }
    items.chunks(size).map(|c| c.to_vec()).collect()
}
