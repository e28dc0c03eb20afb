//! Bounded-capacity homogeneous collections: `List<T, N>` (variable length,
//! capacity `N`) and `Vector<T, N>` (always exactly `N` elements). Capacity
//! is a const generic so an overflowing push or a malformed decode is a
//! caught error, never a silent truncation (`spec.md §4.2`, "List capacity
//! exceeded").

use crate::error::CoreError;
use crate::merkleizer;
use crate::primitives::Root;
use crate::ssz::container::Merkleize;
use crate::ssz::SimpleSerialize;
use std::ops::Deref;

/// A homogeneous sequence of at most `N` elements of type `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List<T, const N: usize> {
    items: Vec<T>,
}

impl<T, const N: usize> List<T, N> {
    pub fn new() -> Self {
        List { items: Vec::new() }
    }

    pub fn push(&mut self, item: T) -> Result<(), CoreError> {
        if self.items.len() >= N {
            return Err(CoreError::ListCapacityExceeded { length: self.items.len() + 1, limit: N });
        }
        self.items.push(item);
        Ok(())
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

impl<T, const N: usize> Default for List<T, N> {
    fn default() -> Self {
        List::new()
    }
}

impl<T, const N: usize> Deref for List<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T, const N: usize> TryFrom<Vec<T>> for List<T, N> {
    type Error = CoreError;

    fn try_from(items: Vec<T>) -> Result<Self, CoreError> {
        if items.len() > N {
            return Err(CoreError::ListCapacityExceeded { length: items.len(), limit: N });
        }
        Ok(List { items })
    }
}

/// A homogeneous sequence of exactly `N` elements of type `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vector<T, const N: usize> {
    items: Vec<T>,
}

impl<T, const N: usize> Deref for Vector<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T, const N: usize> TryFrom<Vec<T>> for Vector<T, N> {
    type Error = CoreError;

    fn try_from(items: Vec<T>) -> Result<Self, CoreError> {
        if items.len() != N {
            return Err(CoreError::VectorLengthMismatch { expected: N, got: items.len() });
        }
        Ok(Vector { items })
    }
}

impl<T: Clone + Default, const N: usize> Default for Vector<T, N> {
    fn default() -> Self {
        Vector { items: vec![T::default(); N] }
    }
}

/// Capacity-chunk depth for a sequence of up to `capacity` elements of `T`:
/// basic types pack several per 32-byte chunk; composite types get one
/// chunk per element (`spec.md §4.2`, packing rules).
pub(crate) fn data_depth<T: Merkleize>(capacity: usize) -> u32 {
    if T::IS_BASIC {
        let item_size = T::fixed_size().expect("basic SSZ types are always fixed-size");
        let total_bytes = capacity * item_size;
        let chunk_count = total_bytes.div_ceil(32).max(1);
        merkleizer::ceil_log2(chunk_count)
    } else {
        merkleizer::ceil_log2(capacity.max(1))
    }
}

/// Leaf chunks for a populated (non-padded) homogeneous sequence: packed
/// bytes for basic `T`, one `hash_tree_root` per element otherwise.
pub(crate) fn leaf_chunks<T: Merkleize>(items: &[T]) -> Vec<Root> {
    if T::IS_BASIC {
        let mut bytes = Vec::new();
        for item in items {
            item.serialize(&mut bytes);
        }
        let chunk_count = bytes.len().div_ceil(32).max(1);
        let mut chunks = Vec::with_capacity(chunk_count);
        for i in 0..chunk_count {
            let start = i * 32;
            let end = (start + 32).min(bytes.len());
            let mut chunk = [0u8; 32];
            chunk[..end - start].copy_from_slice(&bytes[start..end]);
            chunks.push(Root(chunk));
        }
        chunks
    } else {
        items.iter().map(Merkleize::hash_tree_root).collect()
    }
}

fn sequence_is_variable_size<T: SimpleSerialize>() -> bool {
    T::is_variable_size()
}

fn serialize_sequence<T: SimpleSerialize>(items: &[T], out: &mut Vec<u8>) {
    if sequence_is_variable_size::<T>() {
        let fixed_part_len = items.len() * 4;
        let mut offset = fixed_part_len as u32;
        let mut bodies = Vec::new();
        for item in items {
            out.extend_from_slice(&offset.to_le_bytes());
            let mut body = Vec::new();
            item.serialize(&mut body);
            offset += body.len() as u32;
            bodies.push(body);
        }
        for body in bodies {
            out.extend_from_slice(&body);
        }
    } else {
        for item in items {
            item.serialize(out);
        }
    }
}

fn sequence_serialized_size<T: SimpleSerialize>(items: &[T]) -> usize {
    if sequence_is_variable_size::<T>() {
        items.len() * 4 + items.iter().map(T::serialized_size).sum::<usize>()
    } else {
        items.len() * T::fixed_size().unwrap_or(0)
    }
}

fn deserialize_fixed_sequence<T: SimpleSerialize>(bytes: &[u8]) -> Result<Vec<T>, CoreError> {
    let item_size = T::fixed_size().expect("fixed-size branch requires fixed-size T");
    if item_size == 0 {
        return if bytes.is_empty() { Ok(Vec::new()) } else {
            Err(CoreError::TrailingBytes { expected: 0, got: bytes.len() })
        };
    }
    if bytes.len() % item_size != 0 {
        return Err(CoreError::TrailingBytes {
            expected: (bytes.len() / item_size) * item_size,
            got: bytes.len(),
        });
    }
    bytes.chunks_exact(item_size).map(T::deserialize).collect()
}

fn deserialize_variable_sequence<T: SimpleSerialize>(bytes: &[u8]) -> Result<Vec<T>, CoreError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    if bytes.len() < 4 {
        return Err(CoreError::ShortInput { expected: 4, got: bytes.len() });
    }
    let first_offset = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
    if first_offset == 0 || first_offset as usize % 4 != 0 || first_offset as usize > bytes.len() {
        return Err(CoreError::OffsetOutOfBounds { offset: first_offset, limit: bytes.len() as u32 });
    }
    let count = first_offset as usize / 4;
    let mut offsets = Vec::with_capacity(count);
    for i in 0..count {
        let start = i * 4;
        offsets.push(u32::from_le_bytes(bytes[start..start + 4].try_into().unwrap()));
    }
    for pair in offsets.windows(2) {
        if pair[1] < pair[0] {
            return Err(CoreError::OffsetOutOfBounds { offset: pair[1], limit: bytes.len() as u32 });
        }
    }
    if let Some(&last) = offsets.last() {
        if last as usize > bytes.len() {
            return Err(CoreError::OffsetOutOfBounds { offset: last, limit: bytes.len() as u32 });
        }
    }
    let mut items = Vec::with_capacity(count);
    for i in 0..count {
        let start = offsets[i] as usize;
        let end = offsets.get(i + 1).map_or(bytes.len(), |&o| o as usize);
        items.push(T::deserialize(&bytes[start..end])?);
    }
    Ok(items)
}

macro_rules! impl_simple_serialize_for_sequence {
    ($seq:ident, $fixed:expr) => {
        impl<T: SimpleSerialize, const N: usize> SimpleSerialize for $seq<T, N> {
            fn is_variable_size() -> bool {
                $fixed.is_none() || T::is_variable_size()
            }

            fn fixed_size() -> Option<usize> {
                if T::is_variable_size() {
                    None
                } else {
                    $fixed.map(|n: usize| n * T::fixed_size().unwrap())
                }
            }

            fn serialized_size(&self) -> usize {
                sequence_serialized_size(&self.items)
            }

            fn serialize(&self, out: &mut Vec<u8>) {
                serialize_sequence(&self.items, out);
            }

            fn deserialize(bytes: &[u8]) -> Result<Self, CoreError> {
                let items = if T::is_variable_size() {
                    deserialize_variable_sequence(bytes)?
                } else {
                    deserialize_fixed_sequence(bytes)?
                };
                Self::try_from(items)
            }
        }
    };
}

impl_simple_serialize_for_sequence!(List, Option::<usize>::None);
impl_simple_serialize_for_sequence!(Vector, Some(N));

impl<T: Merkleize, const N: usize> Merkleize for List<T, N> {
    fn hash_tree_root(&self) -> Root {
        let chunks = leaf_chunks(&self.items);
        let depth = data_depth::<T>(N);
        let data_root = merkleizer::merkleize_chunks(&chunks, depth);
        merkleizer::mix_in_length(data_root, self.items.len())
    }
}

impl<T: Merkleize, const N: usize> Merkleize for Vector<T, N> {
    fn hash_tree_root(&self) -> Root {
        let chunks = leaf_chunks(&self.items);
        let depth = data_depth::<T>(N);
        merkleizer::merkleize_chunks(&chunks, depth)
    }
}

/// Sibling path from `items[index]` to the list's own root (which mixes in
/// `items.len()`), for composite (non-basic) element types. Returns
/// `(leaf, gindex, branch, root)` where `gindex` already accounts for the
/// length mix-in level (`spec.md §4.2`/`§4.3`).
pub(crate) fn prove_list_element<T: Merkleize>(
    items: &[T],
    capacity: usize,
    index: usize,
) -> Result<(Root, u64, Vec<Root>, Root), CoreError> {
    if T::IS_BASIC {
        return Err(CoreError::Internal(
            "proofs for packed-basic list elements are not supported".to_string(),
        ));
    }
    if index >= items.len() {
        return Err(CoreError::FieldPathNotFound { path: format!("list element index {index}") });
    }
    let chunks = leaf_chunks(items);
    let depth = data_depth::<T>(capacity);
    let (mut branch, data_root) = merkleizer::prove_chunk(&chunks, index, depth);
    branch.push(merkleizer::length_chunk(items.len()));
    let root = merkleizer::mix_in_length(data_root, items.len());
    let gindex = crate::gindex::index_to_gindex(index, depth + 1);
    Ok((chunks[index], gindex, branch, root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_push_respects_capacity() {
        let mut list: List<u64, 2> = List::new();
        list.push(1).unwrap();
        list.push(2).unwrap();
        assert!(list.push(3).is_err());
    }

    #[test]
    fn vector_requires_exact_length() {
        assert!(Vector::<u64, 3>::try_from(vec![1, 2]).is_err());
        assert!(Vector::<u64, 3>::try_from(vec![1, 2, 3]).is_ok());
    }

    #[test]
    fn fixed_basic_list_roundtrip() {
        let list: List<u32, 8> = List::try_from(vec![1, 2, 3]).unwrap();
        let bytes = list.to_ssz_bytes();
        assert_eq!(bytes.len(), 12);
        let back = List::<u32, 8>::deserialize(&bytes).unwrap();
        assert_eq!(&*back, &[1, 2, 3]);
    }

    #[test]
    fn basic_list_packs_multiple_values_per_chunk() {
        // four u64s pack into a single 32-byte chunk
        let list: List<u64, 8> = List::try_from(vec![1, 2, 3, 4]).unwrap();
        let chunks = leaf_chunks(&list.items);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn list_root_mixes_in_length() {
        let list: List<u64, 8> = List::try_from(vec![1, 2, 3]).unwrap();
        let chunks = leaf_chunks(&list.items);
        let depth = data_depth::<u64>(8);
        let data_root = merkleizer::merkleize_chunks(&chunks, depth);
        let expected = merkleizer::mix_in_length(data_root, 3);
        assert_eq!(list.hash_tree_root(), expected);
    }

    #[test]
    fn vector_root_does_not_mix_in_length() {
        let vector: Vector<u64, 4> = Vector::try_from(vec![1, 2, 3, 4]).unwrap();
        let chunks = leaf_chunks(&vector.items);
        let depth = data_depth::<u64>(4);
        let expected = merkleizer::merkleize_chunks(&chunks, depth);
        assert_eq!(vector.hash_tree_root(), expected);
    }

    #[test]
    fn empty_list_has_deterministic_root() {
        let list: List<u64, 8> = List::new();
        let a = list.hash_tree_root();
        let b = list.hash_tree_root();
        assert_eq!(a, b);
    }
}
