// src/merkle.rs
//! RFC 6962 Merkle tree hashing and consistency proof verification
//!
//! [`MerkleTreeBuilder`] keeps only the compact range of a growing tree (one
//! hash per perfect subtree on its right border), so leaves can be streamed in
//! during a scan and the root computed at the end.

use sha2::{Digest, Sha256};

use crate::ct_log::types::SignedTreeHead;

pub const HASH_SIZE: usize = 32;

/// SHA-256 node of the log's Merkle tree
pub type MerkleHash = [u8; HASH_SIZE];

/// Ordered audit path proving one tree head is a prefix of another
pub type ConsistencyProof = Vec<MerkleHash>;

const LEAF_HASH_PREFIX: u8 = 0x00;
const NODE_HASH_PREFIX: u8 = 0x01;

/// Hash of a leaf's `MerkleTreeLeaf` encoding
pub fn hash_leaf(leaf_input: &[u8]) -> MerkleHash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_HASH_PREFIX]);
    hasher.update(leaf_input);
    hasher.finalize().into()
}

/// Hash of an interior node
pub fn hash_children(left: &MerkleHash, right: &MerkleHash) -> MerkleHash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_HASH_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Root of the empty tree
pub fn empty_root() -> MerkleHash {
    Sha256::digest(b"").into()
}

/// Incremental builder for the root hash of a log prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerkleTreeBuilder {
    stack: Vec<MerkleHash>,
    size: u64,
}

impl MerkleTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of leaves added so far
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Append the next leaf hash
    pub fn add(&mut self, leaf_hash: MerkleHash) {
        self.stack.push(leaf_hash);
        self.size += 1;

        let mut size = self.size;
        while size % 2 == 0 {
            let (Some(right), Some(left)) = (self.stack.pop(), self.stack.pop()) else {
                break;
            };
            self.stack.push(hash_children(&left, &right));
            size /= 2;
        }
    }

    /// Root hash of the leaves added so far
    pub fn root(&self) -> MerkleHash {
        let mut subtrees = self.stack.iter().rev();
        match subtrees.next() {
            None => empty_root(),
            Some(last) => subtrees.fold(*last, |acc, left| hash_children(left, &acc)),
        }
    }
}

/// Verify that `second` extends `first` using an RFC 9162 consistency proof
///
/// On success also returns a builder holding `first`'s compact range, so that
/// adding the leaves `first.tree_size..second.tree_size` reproduces
/// `second.root_hash`. No builder is returned for two equal non-empty heads,
/// since the proof carries no subtree hashes in that case.
pub fn verify_consistency_proof(
    proof: &[MerkleHash],
    first: &SignedTreeHead,
    second: &SignedTreeHead,
) -> (bool, Option<MerkleTreeBuilder>) {
    let (first_size, second_size) = (first.tree_size, second.tree_size);

    if first_size > second_size {
        return (false, None);
    }
    if first_size == second_size {
        if !proof.is_empty() || first.root_hash != second.root_hash {
            return (false, None);
        }
        let builder = (first_size == 0).then(MerkleTreeBuilder::new);
        return (true, builder);
    }
    if first_size == 0 {
        // The empty tree is a prefix of every tree
        return match proof.is_empty() {
            true => (true, Some(MerkleTreeBuilder::new())),
            false => (false, None),
        };
    }

    let mut path = Vec::with_capacity(proof.len() + 1);
    if first_size.is_power_of_two() {
        path.push(first.root_hash);
    }
    path.extend_from_slice(proof);
    let Some((&seed, rest)) = path.split_first() else {
        return (false, None);
    };

    let mut first_node = first_size - 1;
    let mut second_node = second_size - 1;
    while first_node & 1 == 1 {
        first_node >>= 1;
        second_node >>= 1;
    }

    let mut first_root = seed;
    let mut second_root = seed;
    // Subtrees of the first tree, smallest (rightmost) first
    let mut compact = vec![seed];

    for node in rest {
        if second_node == 0 {
            return (false, None);
        }
        if first_node & 1 == 1 || first_node == second_node {
            first_root = hash_children(node, &first_root);
            second_root = hash_children(node, &second_root);
            compact.push(*node);
            while first_node & 1 == 0 && first_node != 0 {
                first_node >>= 1;
                second_node >>= 1;
            }
        } else {
            second_root = hash_children(&second_root, node);
        }
        first_node >>= 1;
        second_node >>= 1;
    }

    if first_root != first.root_hash || second_root != second.root_hash || second_node != 0 {
        return (false, None);
    }

    compact.reverse();
    let builder = MerkleTreeBuilder {
        stack: compact,
        size: first_size,
    };
    (true, Some(builder))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<MerkleHash> {
        (0..n).map(|i| hash_leaf(format!("leaf-{i}").as_bytes())).collect()
    }

    fn split_point(n: usize) -> usize {
        let mut k = 1;
        while k * 2 < n {
            k *= 2;
        }
        k
    }

    /// Recursive MTH from RFC 6962 section 2.1
    fn reference_root(leaves: &[MerkleHash]) -> MerkleHash {
        match leaves.len() {
            0 => empty_root(),
            1 => leaves[0],
            n => {
                let k = split_point(n);
                hash_children(&reference_root(&leaves[..k]), &reference_root(&leaves[k..]))
            }
        }
    }

    /// SUBPROOF from RFC 6962 section 2.1.2
    fn reference_subproof(m: usize, leaves: &[MerkleHash], complete: bool) -> Vec<MerkleHash> {
        let n = leaves.len();
        if m == n {
            return if complete { vec![] } else { vec![reference_root(leaves)] };
        }
        let k = split_point(n);
        if m <= k {
            let mut proof = reference_subproof(m, &leaves[..k], complete);
            proof.push(reference_root(&leaves[k..]));
            proof
        } else {
            let mut proof = reference_subproof(m - k, &leaves[k..], false);
            proof.push(reference_root(&leaves[..k]));
            proof
        }
    }

    fn sth(leaves: &[MerkleHash]) -> SignedTreeHead {
        SignedTreeHead {
            tree_size: leaves.len() as u64,
            timestamp: 0,
            root_hash: reference_root(leaves),
            signature: Vec::new(),
        }
    }

    #[test]
    fn test_known_hashes() {
        assert_eq!(
            hex::encode(empty_root()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hex::encode(hash_leaf(b"")),
            "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d"
        );
    }

    #[test]
    fn test_builder_matches_reference_root() {
        let all = leaves(33);
        let mut builder = MerkleTreeBuilder::new();
        assert_eq!(builder.root(), empty_root());

        for (i, leaf) in all.iter().enumerate() {
            builder.add(*leaf);
            assert_eq!(builder.size(), i as u64 + 1);
            assert_eq!(builder.root(), reference_root(&all[..=i]), "size {}", i + 1);
        }
    }

    #[test]
    fn test_valid_proofs_verify_and_rebuild_second_root() {
        let all = leaves(20);
        for n in 1..=all.len() {
            for m in 1..n {
                let proof = reference_subproof(m, &all[..n], true);
                let (first, second) = (sth(&all[..m]), sth(&all[..n]));

                let (valid, builder) = verify_consistency_proof(&proof, &first, &second);
                assert!(valid, "proof {m} -> {n} rejected");

                let mut builder = builder.expect("builder for valid proof");
                assert_eq!(builder.size(), m as u64);
                assert_eq!(builder.root(), first.root_hash);
                for leaf in &all[m..n] {
                    builder.add(*leaf);
                }
                assert_eq!(builder.root(), second.root_hash, "rebuild {m} -> {n}");
            }
        }
    }

    #[test]
    fn test_tampered_proofs_fail() {
        let all = leaves(13);
        for (m, n) in [(1, 2), (3, 7), (4, 13), (6, 8), (7, 12)] {
            let (first, second) = (sth(&all[..m]), sth(&all[..n]));
            let proof = reference_subproof(m, &all[..n], true);

            for i in 0..proof.len() {
                let mut bad = proof.clone();
                bad[i][0] ^= 0xff;
                let (valid, builder) = verify_consistency_proof(&bad, &first, &second);
                assert!(!valid, "tampered node {i} accepted for {m} -> {n}");
                assert!(builder.is_none());
            }

            let mut truncated = proof.clone();
            truncated.pop();
            assert!(!verify_consistency_proof(&truncated, &first, &second).0);

            let mut extended = proof.clone();
            extended.push(all[0]);
            assert!(!verify_consistency_proof(&extended, &first, &second).0);
        }
    }

    #[test]
    fn test_rewritten_history_fails() {
        let all = leaves(10);
        let mut forked = all.clone();
        forked[2] = hash_leaf(b"rewritten");

        let first = sth(&all[..5]);
        let second = sth(&forked);
        let proof = reference_subproof(5, &forked, true);
        assert!(!verify_consistency_proof(&proof, &first, &second).0);
    }

    #[test]
    fn test_equal_sizes() {
        let all = leaves(6);
        let head = sth(&all);

        assert_eq!(verify_consistency_proof(&[], &head, &head), (true, None));
        assert!(!verify_consistency_proof(&[all[0]], &head, &head).0);

        let mut other = head.clone();
        other.root_hash = empty_root();
        assert!(!verify_consistency_proof(&[], &head, &other).0);

        let empty = sth(&[]);
        assert_eq!(
            verify_consistency_proof(&[], &empty, &empty),
            (true, Some(MerkleTreeBuilder::new()))
        );
    }

    #[test]
    fn test_empty_first_tree() {
        let all = leaves(4);
        let (first, second) = (sth(&[]), sth(&all));

        let (valid, builder) = verify_consistency_proof(&[], &first, &second);
        assert!(valid);
        assert_eq!(builder.map(|b| b.size()), Some(0));

        assert!(!verify_consistency_proof(&[all[0]], &first, &second).0);
    }

    #[test]
    fn test_shrinking_tree_fails() {
        let all = leaves(5);
        let (first, second) = (sth(&all), sth(&all[..3]));
        assert_eq!(verify_consistency_proof(&[], &first, &second), (false, None));
    }
}
