//! Generalized indices: a single integer encoding of depth and left/right
//! path in a binary tree rooted at 1 (`spec.md` GLOSSARY, "Generalized
//! index (gindex)").
//!
//! A node at depth `d` (root is depth 0) reached by path bits `b_0..b_{d-1}`
//! (`0` = left, `1` = right, root-to-node order) has gindex
//! `(1 << d) | (b_0 << (d-1)) | ... | b_{d-1}`.

use crate::error::CoreError;
use crate::merkleizer::MAX_DEPTH;

/// `63 - gindex.leading_zeros()`: the depth of the node a gindex addresses.
/// `gindex` must be nonzero (gindex 0 never occurs; the root is gindex 1).
#[must_use]
pub fn gindex_depth(gindex: u64) -> u32 {
    63 - gindex.leading_zeros()
}

/// Validate that `gindex` is nonzero and within the depth this crate walks.
pub fn check_gindex(gindex: u64) -> Result<(), CoreError> {
    if gindex == 0 {
        return Err(CoreError::GindexOutOfRange { gindex, max_depth: MAX_DEPTH as u32 });
    }
    let depth = gindex_depth(gindex);
    if depth as usize > MAX_DEPTH {
        return Err(CoreError::GindexOutOfRange { gindex, max_depth: MAX_DEPTH as u32 });
    }
    Ok(())
}

/// Compose an inner gindex (relative to a subtree's own root) with the
/// outer gindex of the leaf that subtree hangs from, producing the single
/// gindex that addresses the inner node from the outer tree's root
/// (`spec.md §4.3`, "Cross-container composition").
#[must_use]
pub fn concat_gindices(outer: u64, inner: u64) -> u64 {
    let inner_depth = gindex_depth(inner);
    (outer << inner_depth) | (inner & ((1u64 << inner_depth) - 1))
}

/// The zero-based leaf index and depth a gindex addresses: `gindex - 2^depth`.
#[must_use]
pub fn gindex_to_index(gindex: u64) -> (usize, u32) {
    let depth = gindex_depth(gindex);
    let index = gindex - (1u64 << depth);
    (index as usize, depth)
}

/// The gindex of leaf `index` in a tree of depth `depth`.
#[must_use]
pub fn index_to_gindex(index: usize, depth: u32) -> u64 {
    (1u64 << depth) | (index as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_of_root_is_zero() {
        assert_eq!(gindex_depth(1), 0);
    }

    #[test]
    fn depth_matches_bit_length() {
        assert_eq!(gindex_depth(2), 1);
        assert_eq!(gindex_depth(3), 1);
        assert_eq!(gindex_depth(4), 2);
        assert_eq!(gindex_depth(7), 2);
        assert_eq!(gindex_depth(8), 3);
    }

    #[test]
    fn index_gindex_roundtrip() {
        for depth in 0..10 {
            for index in 0..(1usize << depth) {
                let g = index_to_gindex(index, depth);
                assert_eq!(gindex_to_index(g), (index, depth));
            }
        }
    }

    #[test]
    fn concat_matches_manual_composition() {
        // outer leaf 3 at depth 2 (gindex 7), inner leaf 1 at depth 1 (gindex 3)
        let outer = index_to_gindex(3, 2);
        let inner = index_to_gindex(1, 1);
        let composed = concat_gindices(outer, inner);
        // composed tree has depth 2+1=3, composed index = 3*2 + 1 = 7
        assert_eq!(gindex_to_index(composed), (7, 3));
    }

    #[test]
    fn check_gindex_rejects_zero() {
        assert!(check_gindex(0).is_err());
        assert!(check_gindex(1).is_ok());
    }

    #[test]
    fn check_gindex_rejects_excess_depth() {
        let too_deep = 1u64 << 63;
        assert!(check_gindex(too_deep).is_err());
    }
}
