//! Hashers (feature-gated) and the domain-separated hash derivations of the map.
//!
//! The map commits to its contents through four derivations, each tagged with a single
//! prefix byte. Distinct tags prevent any cross-kind second-preimage: a branch hash
//! cannot be mistaken for a leaf value hash or for the top-level index hash. Branch
//! hashes commit to the compressed form of the child paths, so the hash covers the
//! significant bits only and never irrelevant padding.

use alloc::vec::Vec;

use crate::path::{PathKind, ProofPath};
use crate::Hash;

/// Domain tag of a hashed leaf value.
pub const LEAF_VALUE_PREFIX: u8 = 0x00;
/// Domain tag of the top-level index hash.
pub const MAP_ROOT_PREFIX: u8 = 0x03;
/// Domain tag of a map node: a branch, or the root of a single-entry map.
pub const MAP_NODE_PREFIX: u8 = 0x04;

/// A simple trait for representing binary hash functions.
pub trait BinaryHash {
    /// Given a byte string, produce a 32-byte hash.
    fn hash(input: &[u8]) -> Hash;

    /// An optional specialization of `hash` where the input is the concatenation of
    /// several parts. Implementations should drive an incremental hasher over the parts
    /// in order rather than materializing the concatenation.
    fn hash_parts(parts: &[&[u8]]) -> Hash {
        let mut buf = Vec::new();
        for part in parts {
            buf.extend_from_slice(part);
        }
        Self::hash(&buf)
    }
}

/// Blanket implementation for all implementations of `Digest`.
impl<H: digest::Digest<OutputSize = digest::typenum::U32> + Send + Sync> BinaryHash for H {
    fn hash(input: &[u8]) -> Hash {
        H::digest(input).into()
    }

    fn hash_parts(parts: &[&[u8]]) -> Hash {
        let mut hasher = H::new();
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize().into()
    }
}

/// The domain-separated hash derivations of the map, provided for any [`BinaryHash`].
///
/// The prefix bytes and payload layouts are part of the wire contract; implementations
/// supply the primitive only and must not override the derivations.
pub trait MapHasher: BinaryHash {
    /// Hash a leaf value.
    fn hash_leaf_value(value: &[u8]) -> Hash {
        Self::hash_parts(&[&[LEAF_VALUE_PREFIX], value])
    }

    /// Compute the Merkle root of a map holding exactly one entry. The path must be
    /// leaf-typed and is committed in its full encoding.
    fn hash_single_entry_root(path: &ProofPath, value_hash: &Hash) -> Hash {
        debug_assert_eq!(path.kind(), PathKind::Leaf);
        Self::hash_parts(&[
            &[MAP_NODE_PREFIX],
            path.raw_bytes(),
            &[path.len_byte()],
            value_hash,
        ])
    }

    /// Compute a branch hash from its two children, given as subtree hashes and subtree
    /// root paths. Child paths are committed in their compressed encoding.
    fn hash_branch(
        left_hash: &Hash,
        right_hash: &Hash,
        left_path: &ProofPath,
        right_path: &ProofPath,
    ) -> Hash {
        Self::hash_parts(&[
            &[MAP_NODE_PREFIX],
            left_hash,
            right_hash,
            left_path.compressed_bytes(),
            &[left_path.len_byte()],
            right_path.compressed_bytes(),
            &[right_path.len_byte()],
        ])
    }

    /// Wrap a Merkle root into the index hash reported to the caller.
    fn hash_index(merkle_root: &Hash) -> Hash {
        Self::hash_parts(&[&[MAP_ROOT_PREFIX], merkle_root])
    }
}

impl<T: BinaryHash> MapHasher for T {}

#[cfg(any(feature = "sha2-hasher", test))]
pub use self::sha2::Sha2Hasher;

/// A hasher making use of sha2-256, the canonical map hash.
#[cfg(any(feature = "sha2-hasher", test))]
pub mod sha2 {
    use super::BinaryHash;
    use crate::Hash;
    use sha2::{Digest, Sha256};

    /// A [`BinaryHash`] implementation for Sha2.
    pub struct Sha2Hasher;

    impl BinaryHash for Sha2Hasher {
        fn hash(input: &[u8]) -> Hash {
            let mut hasher = Sha256::new();
            hasher.update(input);
            hasher.finalize().into()
        }

        fn hash_parts(parts: &[&[u8]]) -> Hash {
            let mut hasher = Sha256::new();
            for part in parts {
                hasher.update(part);
            }
            hasher.finalize().into()
        }
    }
}

#[cfg(any(feature = "blake3-hasher", test))]
pub use self::blake3::Blake3Hasher;

/// A hasher making use of blake3.
#[cfg(any(feature = "blake3-hasher", test))]
pub mod blake3 {
    use super::BinaryHash;
    use crate::Hash;

    /// A [`BinaryHash`] implementation for Blake3.
    pub struct Blake3Hasher;

    impl BinaryHash for Blake3Hasher {
        fn hash(input: &[u8]) -> Hash {
            blake3::hash(input).into()
        }

        fn hash_parts(parts: &[&[u8]]) -> Hash {
            let mut hasher = blake3::Hasher::new();
            for part in parts {
                hasher.update(part);
            }
            hasher.finalize().into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::sha2::{Digest, Sha256};

    fn digest_concat(parts: &[&[u8]]) -> Hash {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize().into()
    }

    #[test]
    fn leaf_value_hash_is_prefixed_blob_hash() {
        assert_eq!(
            Sha2Hasher::hash_leaf_value(b"some value"),
            digest_concat(&[&[0x00], b"some value"]),
        );
        assert_eq!(
            Sha2Hasher::hash_leaf_value(&[]),
            digest_concat(&[&[0x00]]),
        );
    }

    #[test]
    fn index_hash_wraps_the_root() {
        let root = [0xd4; 32];
        assert_eq!(
            Sha2Hasher::hash_index(&root),
            digest_concat(&[&[0x03], &root]),
        );
    }

    #[test]
    fn single_entry_root_commits_the_full_path() {
        let key = [0x11; 32];
        let value_hash = Sha2Hasher::hash_leaf_value(&[0xaa]);
        // Full encoding: 32 raw bytes, then the count byte, which wraps to 0 for a leaf.
        let expected = digest_concat(&[&[0x04], &key, &[0u8], &value_hash]);
        assert_eq!(
            Sha2Hasher::hash_single_entry_root(&ProofPath::new_leaf(key), &value_hash),
            expected,
        );
    }

    #[test]
    fn branch_hash_commits_compressed_paths() {
        let left_path = ProofPath::from_bit_str("0010");
        let right_path = ProofPath::from_bit_str("0011");
        let left_hash = [1; 32];
        let right_hash = [2; 32];
        let expected = digest_concat(&[
            &[0x04],
            &left_hash,
            &right_hash,
            &[0b0010_0000, 4],
            &[0b0011_0000, 4],
        ]);
        assert_eq!(
            Sha2Hasher::hash_branch(&left_hash, &right_hash, &left_path, &right_path),
            expected,
        );
    }

    #[test]
    fn derivations_are_domain_separated() {
        // The same 32 bytes hashed under each tag must disagree.
        let payload = [0x5e; 32];
        let as_value = Sha2Hasher::hash_leaf_value(&payload);
        let as_index = Sha2Hasher::hash_index(&payload);
        assert_ne!(as_value, as_index);
    }

    #[test]
    fn any_digest_is_a_binary_hash() {
        assert_eq!(<Sha256 as BinaryHash>::hash(b"abc"), Sha2Hasher::hash(b"abc"));
        assert_eq!(
            <Sha256 as BinaryHash>::hash_parts(&[b"ab", b"c"]),
            Sha2Hasher::hash(b"abc"),
        );
    }
}
