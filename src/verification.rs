//! Structural validation and root reconstruction for flat map proofs.
//!
//! The proof arrives as a flat list of path-tagged subtree hashes plus the requested
//! entries. Under the total path order, any two siblings of the original trie appear
//! adjacent in the sorted merge of the two lists before any more distant relative, so
//! the root can be recomputed with a single left-to-right pass over the merge and an
//! explicit stack of completed subtrees (the *contour*). An explicit stack also keeps
//! the pass safe for adversarially deep proofs, where recursion would overflow.

use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::hasher::MapHasher;
use crate::path::{PathKind, ProofPath};
use crate::proof::{CheckedMapProof, MapProof, MapProofError};
use crate::{Hash, EMPTY_ROOT};

/// A resolved proof node: a subtree root path plus its fixed-size hash. Contour stack
/// entries are of this shape, as are the synthesized leaves of requested entries.
#[derive(Debug, Clone)]
struct ProofNode {
    path: ProofPath,
    hash: Hash,
}

impl MapProof {
    /// Check this proof.
    ///
    /// On success, the returned [`CheckedMapProof`] carries the reconstructed index
    /// hash and the confirmed present/absent key sets. On failure, the returned
    /// [`MapProofError`] names the first structural violation encountered; the checks
    /// run in a fixed order (entry ordering, then hash sizes, then requested-key
    /// coverage, then size dispatch) so equal proofs always report equal rejections.
    ///
    /// Whether the reconstructed index hash matches a trusted one is for the caller to
    /// decide; a hash mismatch is not a structural violation.
    pub fn check<H: MapHasher>(&self) -> Result<CheckedMapProof, MapProofError> {
        self.check_order()?;
        let proof = self.sized_hashes()?;
        self.check_requested_keys_not_covered()?;

        let root = match proof.len() + self.entries.len() {
            0 => EMPTY_ROOT,
            1 => self.single_entry_root::<H>(&proof)?,
            _ => self.fold_contour::<H>(proof),
        };

        Ok(CheckedMapProof::new(
            H::hash_index(&root),
            self.entries
                .iter()
                .map(|entry| (entry.key, entry.value.clone()))
                .collect(),
            self.missing_keys.iter().copied().collect(),
        ))
    }

    // Checks that the proof entries are unique, mutually prefix-free, and in ascending
    // path order. Adjacency suffices: in a sorted list, a path and any path it is a
    // prefix of can only be separated by further extensions of the same prefix.
    fn check_order(&self) -> Result<(), MapProofError> {
        for pair in self.proof_entries.windows(2) {
            let (prev, next) = (&pair[0].path, &pair[1].path);
            match prev.cmp(next) {
                Ordering::Less if prev.is_prefix_of(next) => {
                    return Err(MapProofError::EmbeddedPath)
                }
                Ordering::Less => {}
                Ordering::Equal => return Err(MapProofError::DuplicatePath),
                Ordering::Greater => return Err(MapProofError::InvalidOrder),
            }
        }
        Ok(())
    }

    // Resolves the transmitted hashes into fixed-size hashes, rejecting any other size.
    fn sized_hashes(&self) -> Result<Vec<ProofNode>, MapProofError> {
        self.proof_entries
            .iter()
            .map(|entry| {
                let hash = entry
                    .hash
                    .as_slice()
                    .try_into()
                    .map_err(|_| MapProofError::InvalidHashSize)?;
                Ok(ProofNode {
                    path: entry.path,
                    hash,
                })
            })
            .collect()
    }

    // Rejects proofs in which some proof entry covers a requested key. Such a proof
    // leaves the membership claim ambiguous: the client cannot tell whether the key is
    // hidden inside that subtree.
    fn check_requested_keys_not_covered(&self) -> Result<(), MapProofError> {
        let requested = self
            .entries
            .iter()
            .map(|entry| &entry.key)
            .chain(self.missing_keys.iter());
        for key in requested {
            let leaf = ProofPath::new_leaf(*key);
            // The order check left the entries sorted and mutually prefix-free, so the
            // only entry that can be a prefix of `leaf` is its immediate predecessor in
            // path order.
            match self
                .proof_entries
                .binary_search_by(|entry| entry.path.cmp(&leaf))
            {
                Ok(_) => return Err(MapProofError::EmbeddedPath),
                Err(0) => {}
                Err(i) => {
                    if self.proof_entries[i - 1].path.is_prefix_of(&leaf) {
                        return Err(MapProofError::EmbeddedPath);
                    }
                }
            }
        }
        Ok(())
    }

    // Computes the Merkle root of a proof with exactly one node in total.
    fn single_entry_root<H: MapHasher>(&self, proof: &[ProofNode]) -> Result<Hash, MapProofError> {
        match proof.first() {
            // With no requested entries the sole node must be a leaf: an opaque
            // internal hash presented as the entire tree proves nothing.
            Some(node) => match node.path.kind() {
                PathKind::Branch => Err(MapProofError::NonTerminalNode),
                PathKind::Leaf => Ok(H::hash_single_entry_root(&node.path, &node.hash)),
            },
            None => {
                // The dispatcher guarantees exactly one requested entry here.
                let entry = &self.entries[0];
                let path = ProofPath::new_leaf(entry.key);
                Ok(H::hash_single_entry_root(
                    &path,
                    &H::hash_leaf_value(&entry.value),
                ))
            }
        }
    }

    // The general case: synthesize leaf nodes for the requested entries, merge them
    // with the proof entries, and fold the sorted result into the root.
    fn fold_contour<H: MapHasher>(&self, proof: Vec<ProofNode>) -> Hash {
        let mut nodes = proof;
        nodes.reserve(self.entries.len());
        nodes.extend(self.entries.iter().map(|entry| ProofNode {
            path: ProofPath::new_leaf(entry.key),
            hash: H::hash_leaf_value(&entry.value),
        }));
        nodes.sort_unstable_by(|a, b| a.path.cmp(&b.path));

        let total = nodes.len();
        debug_assert!(total >= 2);

        let mut nodes = nodes.into_iter();
        // unwraps: the dispatcher sends only proofs with two or more nodes here.
        let first = nodes.next().unwrap();
        let second = nodes.next().unwrap();

        let mut last_prefix = first.path.common_prefix(&second.path);
        let mut contour = Vec::with_capacity(total);
        contour.push(first);
        contour.push(second);

        for node in nodes {
            // unwrap: the contour never shrinks below one entry.
            let top = contour.last().unwrap();
            let new_prefix = top.path.common_prefix(&node.path);
            // The new node branches off above the meeting point of the top two
            // subtrees, so no further siblings of theirs are coming: combine them.
            while contour.len() > 1 && new_prefix.num_bits() < last_prefix.num_bits() {
                last_prefix = fold::<H>(&mut contour, last_prefix);
            }
            contour.push(node);
            last_prefix = new_prefix;
        }
        while contour.len() > 1 {
            last_prefix = fold::<H>(&mut contour, last_prefix);
        }

        // unwrap: exactly the root remains.
        contour.pop().unwrap().hash
    }
}

// Folds the top two contour entries into their parent branch at `prefix`. Returns the
// meeting point of the new top two entries, or `prefix` unchanged if the folded entry
// is alone on the contour (the caller will not read it).
fn fold<H: MapHasher>(contour: &mut Vec<ProofNode>, prefix: ProofPath) -> ProofPath {
    // unwraps: callers only fold a contour of two or more entries.
    let right = contour.pop().unwrap();
    let left = contour.pop().unwrap();
    let folded = ProofNode {
        path: prefix,
        hash: H::hash_branch(&left.hash, &right.hash, &left.path, &right.path),
    };
    let next_prefix = contour
        .last()
        .map(|below| below.path.common_prefix(&prefix))
        .unwrap_or(prefix);
    contour.push(folded);
    next_prefix
}
