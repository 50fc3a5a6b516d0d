//! Verification of flat Merkle-Patricia map proofs.
//!
//! The map is a sparse binary Merkle-Patricia trie keyed by fixed-width 256 bit paths.
//! A *flat* proof of inclusion and exclusion transmits only the requested leaves and the
//! hashes of the sibling subtrees strictly required to recompute the trie root;
//! intermediate branches are never transmitted. [`MapProof::check`] decides which of the
//! supplied nodes share a parent, reconstructs those parents in the order the original
//! tree would have used, and rejects every form of proof malleability it knows about:
//! duplicate paths, embedded paths, out-of-order paths, wrong-size hashes, and opaque
//! singleton branches.
//!
//! A successful check yields a [`CheckedMapProof`] carrying the reconstructed *index
//! hash* together with the confirmed present and absent key sets. A client holding a
//! trusted index hash compares it against the reconstructed one to authenticate the
//! claims; the comparison itself is deliberately left to the caller.
//!
//! ## Schema
//!
//! There are two kinds of trie positions, derived from the path width: *branches*, with
//! fewer than 256 significant bits, and *leaves*, with a full-width path. All hash
//! derivations are domain-separated with a single prefix byte, so a hash of one kind
//! cannot be presented as a hash of another:
//!
//! | derivation | prefix | payload |
//! |---|---|---|
//! | leaf value | `0x00` | value bytes |
//! | single-entry root | `0x04` | full path encoding, value hash |
//! | branch | `0x04` | child hashes, then compressed child path encodings |
//! | index hash | `0x03` | Merkle root |
//!
//! The Merkle root of an empty map is [`EMPTY_ROOT`]; its index hash is the `0x03`
//! derivation over it like any other root.
//!
//! The verifier is generic over the 256 bit hash primitive via
//! [`hasher::BinaryHash`]. Sha2-256 is the canonical configuration.
//!
//! Nothing within this crate relies on the standard library unless the `std` feature
//! (on by default) is enabled, and even then only to integrate the error type.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod hasher;
pub mod path;
pub mod proof;

mod verification;

pub use path::{PathKind, ProofPath};
pub use proof::{CheckedMapProof, MapEntry, MapProof, MapProofEntry, MapProofError};

/// The hash of a node or a value. In this schema, it is always 256 bits.
pub type Hash = [u8; 32];

/// The path to a key. All keys have a 256 bit fixed width.
pub type KeyPath = [u8; 32];

/// The width of the hash, in bytes.
pub const HASH_SIZE: usize = 32;

/// The width of a key path, in bits.
pub const KEY_BITS: usize = 256;

/// The Merkle root of an empty map.
pub const EMPTY_ROOT: Hash = [0u8; 32];
