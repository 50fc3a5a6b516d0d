//! The flat map proof data model.
//!
//! A [`MapProof`] is the artifact an untrusted node serves to back its answers about a
//! set of requested keys. It is *unchecked*: nothing about it can be relied upon until
//! [`MapProof::check`] has turned it into a [`CheckedMapProof`] or rejected it with a
//! [`MapProofError`].

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt;

use crate::path::ProofPath;
use crate::{Hash, KeyPath};

/// An entry in a flat map proof: the root path of a subtree the requested keys do not
/// enter, together with that subtree's Merkle hash.
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshDeserialize, borsh::BorshSerialize)
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapProofEntry {
    /// The root path of the subtree this entry stands in for.
    pub path: ProofPath,
    /// The subtree hash, as transmitted. Must be exactly
    /// [`HASH_SIZE`](crate::HASH_SIZE) bytes; [`MapProof::check`] rejects other sizes.
    pub hash: Vec<u8>,
}

impl MapProofEntry {
    /// Create a proof entry.
    pub fn new(path: ProofPath, hash: impl Into<Vec<u8>>) -> Self {
        MapProofEntry {
            path,
            hash: hash.into(),
        }
    }
}

/// A key/value pair the proof claims present in the map.
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshDeserialize, borsh::BorshSerialize)
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    /// The key, interpreted as a full-width leaf path.
    pub key: KeyPath,
    /// The value stored under the key.
    pub value: Vec<u8>,
}

/// An unchecked flat map proof, as decoded from the wire.
///
/// The proof transmits only the requested entries and the subtree hashes strictly
/// required to recompute the map root; no intermediate branches. Checking a proof
/// borrows it and never mutates it.
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshDeserialize, borsh::BorshSerialize)
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapProof {
    /// Subtree entries, required to arrive in ascending path order.
    pub proof_entries: Vec<MapProofEntry>,
    /// Key/value pairs claimed present.
    pub entries: Vec<MapEntry>,
    /// Keys claimed absent.
    pub missing_keys: Vec<KeyPath>,
}

/// The reasons a proof is rejected. A rejected proof is malformed or deliberately
/// malleable and confirms nothing about the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapProofError {
    /// A pair of adjacent proof entries in descending path order.
    InvalidOrder,
    /// Two proof entries with the same path.
    DuplicatePath,
    /// A proof entry path that is a prefix of another proof entry path or of a
    /// requested key.
    EmbeddedPath,
    /// A singleton proof whose sole proof entry is branch-typed.
    NonTerminalNode,
    /// A proof entry hash that is not exactly [`HASH_SIZE`](crate::HASH_SIZE) bytes.
    InvalidHashSize,
}

impl fmt::Display for MapProofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MapProofError::InvalidOrder => "proof entries out of order",
            MapProofError::DuplicatePath => "duplicate proof entry path",
            MapProofError::EmbeddedPath => {
                "proof entry path embeds another proof entry path or a requested key"
            }
            MapProofError::NonTerminalNode => "sole proof entry of a singleton proof is not a leaf",
            MapProofError::InvalidHashSize => "proof entry hash is not 32 bytes",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MapProofError {}

/// A structurally valid map proof: the reconstructed index hash together with the
/// present entries and missing keys it confirms.
///
/// Structural validity alone carries no authority. The caller authenticates the claims
/// by comparing [`index_hash`](Self::index_hash) against an index hash obtained from a
/// trusted source; this comparison is deliberately left outside the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedMapProof {
    index_hash: Hash,
    entries: BTreeMap<KeyPath, Vec<u8>>,
    missing_keys: BTreeSet<KeyPath>,
}

impl CheckedMapProof {
    pub(crate) fn new(
        index_hash: Hash,
        entries: BTreeMap<KeyPath, Vec<u8>>,
        missing_keys: BTreeSet<KeyPath>,
    ) -> Self {
        CheckedMapProof {
            index_hash,
            entries,
            missing_keys,
        }
    }

    /// The reconstructed index hash of the map.
    pub fn index_hash(&self) -> Hash {
        self.index_hash
    }

    /// The confirmed present entries.
    pub fn entries(&self) -> &BTreeMap<KeyPath, Vec<u8>> {
        &self.entries
    }

    /// The confirmed missing keys.
    pub fn missing_keys(&self) -> &BTreeSet<KeyPath> {
        &self.missing_keys
    }

    /// The confirmed value under `key`, if the proof claims it present.
    pub fn get(&self, key: &KeyPath) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Whether the proof claims `key` present.
    pub fn contains(&self, key: &KeyPath) -> bool {
        self.entries.contains_key(key)
    }
}
