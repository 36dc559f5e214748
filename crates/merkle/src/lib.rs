//! # Merkle Tree
//!
//! Bottom-up SHA-1 hash tree over the values of an SSTable run. Leaves hash
//! individual values; internal nodes hash the concatenation of their
//! children's hashes; an unpaired trailing node at any level is promoted to
//! the next level with its hash unchanged.
//!
//! The tree exists only in memory while a run is being written or merged.
//! What gets persisted — the run's Metadata file — is the preorder sequence
//! of node hashes, one lowercase-hex line per node.

use sha1::{Digest, Sha1};
use std::io::{self, Write};

/// Size of a SHA-1 digest in bytes.
pub const HASH_SIZE: usize = 20;

/// One node of the hash tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleNode {
    pub hash: [u8; HASH_SIZE],
    pub left: Option<Box<MerkleNode>>,
    pub right: Option<Box<MerkleNode>>,
}

impl MerkleNode {
    fn leaf(hash: [u8; HASH_SIZE]) -> Self {
        Self {
            hash,
            left: None,
            right: None,
        }
    }
}

/// A fully built hash tree. `root` is `None` for an empty input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    pub root: Option<MerkleNode>,
}

impl MerkleTree {
    /// Builds a tree from precomputed leaf hashes.
    ///
    /// The construction is iterative: each pass pairs consecutive subtrees
    /// into parents and promotes an odd trailing subtree unchanged, until a
    /// single root remains.
    #[must_use]
    pub fn from_leaves(leaves: Vec<[u8; HASH_SIZE]>) -> Self {
        if leaves.is_empty() {
            return Self { root: None };
        }

        let mut level: Vec<MerkleNode> = leaves.into_iter().map(MerkleNode::leaf).collect();

        while level.len() > 1 {
            let mut next = Vec::with_capacity((level.len() + 1) / 2);
            let mut iter = level.into_iter();
            while let Some(left) = iter.next() {
                match iter.next() {
                    Some(right) => {
                        let hash = combine(&left.hash, &right.hash);
                        next.push(MerkleNode {
                            hash,
                            left: Some(Box::new(left)),
                            right: Some(Box::new(right)),
                        });
                    }
                    // Odd node out: promoted as-is.
                    None => next.push(left),
                }
            }
            level = next;
        }

        let root = level.pop();
        Self { root }
    }

    /// Builds a tree by hashing raw values into leaves first.
    #[must_use]
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[u8]>,
    {
        Self::from_leaves(values.into_iter().map(|v| leaf_hash(v.as_ref())).collect())
    }

    /// Returns the root hash, if the tree is non-empty.
    #[must_use]
    pub fn root_hash(&self) -> Option<[u8; HASH_SIZE]> {
        self.root.as_ref().map(|n| n.hash)
    }

    /// Writes the preorder hash sequence (root, full left subtree, full
    /// right subtree) to `sink`, one hex-encoded hash per line.
    ///
    /// Traversal is an explicit stack so deep trees cannot overflow the call
    /// stack.
    pub fn write_preorder<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        let mut stack: Vec<&MerkleNode> = Vec::new();
        if let Some(root) = &self.root {
            stack.push(root);
        }
        while let Some(node) = stack.pop() {
            writeln!(sink, "{}", hex::encode(node.hash))?;
            // Push right first so the left subtree is emitted first.
            if let Some(right) = &node.right {
                stack.push(right);
            }
            if let Some(left) = &node.left {
                stack.push(left);
            }
        }
        Ok(())
    }
}

/// SHA-1 of a raw value — the leaf hash.
#[must_use]
pub fn leaf_hash(value: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha1::new();
    hasher.update(value);
    hasher.finalize().into()
}

/// Parent hash: SHA-1 over the concatenated child hashes.
fn combine(left: &[u8; HASH_SIZE], right: &[u8; HASH_SIZE]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha1::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests;
