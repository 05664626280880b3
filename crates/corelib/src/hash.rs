//! Hash primitive shared by every routing scheme.
//!
//! xxHash64 with a zero seed over the UTF-8 bytes of the key material. Ring
//! positions, rendezvous scores and the alternate stride all derive from it,
//! so it must stay stable across processes and releases.

use xxhash_rust::xxh64::xxh64;

const SEED: u64 = 0;

/// Hash arbitrary key material to 64 bits.
#[inline]
pub fn hash64(material: impl AsRef<[u8]>) -> u64 {
    xxh64(material.as_ref(), SEED)
}
