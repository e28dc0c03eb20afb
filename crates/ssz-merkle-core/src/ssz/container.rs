//! Container support: the `Merkleize` trait, the field-split helpers used by
//! hand-written variable-size containers, and `ssz_fixed_container!`, a
//! `macro_rules!` generator for the common case where every field is
//! fixed-size. Replaces the teacher's `#[derive(SimpleSerialize)]` with a
//! compile-time descriptor this crate controls end to end (`spec.md §9`).

use crate::error::CoreError;
use crate::merkleizer;
use crate::primitives::Root;
use crate::ssz::SimpleSerialize;

/// Computes `hash_tree_root`. Split from `SimpleSerialize` because basic
/// numeric types need a `IS_BASIC` marker that only matters for
/// Merkleization, not encoding.
pub trait Merkleize: SimpleSerialize {
    /// `true` for `u8`/`u16`/`u32`/`u64`/`u128`/`bool`: values of this type
    /// are packed several-per-chunk when used as list/vector elements,
    /// rather than each becoming its own chunk.
    const IS_BASIC: bool = false;

    fn hash_tree_root(&self) -> Root;
}

macro_rules! impl_merkleize_basic {
    ($ty:ty) => {
        impl Merkleize for $ty {
            const IS_BASIC: bool = true;

            fn hash_tree_root(&self) -> Root {
                let mut chunk = [0u8; 32];
                let bytes = self.to_ssz_bytes();
                chunk[..bytes.len()].copy_from_slice(&bytes);
                Root(chunk)
            }
        }
    };
}

impl_merkleize_basic!(u8);
impl_merkleize_basic!(u16);
impl_merkleize_basic!(u32);
impl_merkleize_basic!(u64);
impl_merkleize_basic!(u128);
impl_merkleize_basic!(bool);

impl<const N: usize> Merkleize for [u8; N] {
    fn hash_tree_root(&self) -> Root {
        let chunk_count = N.div_ceil(32).max(1);
        let mut chunks = Vec::with_capacity(chunk_count);
        for i in 0..chunk_count {
            let start = i * 32;
            let end = (start + 32).min(N);
            let mut chunk = [0u8; 32];
            chunk[..end - start].copy_from_slice(&self[start..end]);
            chunks.push(Root(chunk));
        }
        let depth = merkleizer::ceil_log2(chunk_count);
        merkleizer::merkleize_chunks(&chunks, depth)
    }
}

/// A field slot inside a variable-size container's encoding: either the raw
/// fixed-size bytes, or the resolved body of an offset-addressed field.
#[derive(Debug, Clone, Copy)]
pub enum FieldSlot<'a> {
    Fixed(&'a [u8]),
    Variable(&'a [u8]),
}

/// Split `bytes` (a variable-size container's full encoding) into one slot
/// per field, given each field's fixed size (`None` for a variable field).
/// Mirrors the teacher's offset-table handling in `beacon_state.rs`'s
/// deserialization path, generalized to arbitrary field layouts.
pub fn split_variable_container<'a>(
    bytes: &'a [u8],
    fixed_sizes: &[Option<usize>],
) -> Result<Vec<FieldSlot<'a>>, CoreError> {
    let mut cursor = 0usize;
    let mut offsets: Vec<(usize, u32)> = Vec::new();
    let mut slots: Vec<Option<FieldSlot<'a>>> = vec![None; fixed_sizes.len()];

    for (i, fixed) in fixed_sizes.iter().enumerate() {
        match fixed {
            Some(size) => {
                if cursor + size > bytes.len() {
                    return Err(CoreError::ShortInput { expected: cursor + size, got: bytes.len() });
                }
                slots[i] = Some(FieldSlot::Fixed(&bytes[cursor..cursor + size]));
                cursor += size;
            }
            None => {
                if cursor + 4 > bytes.len() {
                    return Err(CoreError::ShortInput { expected: cursor + 4, got: bytes.len() });
                }
                let offset = u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap());
                offsets.push((i, offset));
                cursor += 4;
            }
        }
    }

    let fixed_part_len = cursor as u32;
    if let Some(&(_, first)) = offsets.first() {
        if first != fixed_part_len {
            return Err(CoreError::OffsetOutOfBounds { offset: first, limit: bytes.len() as u32 });
        }
    }
    for pair in offsets.windows(2) {
        if pair[1].1 < pair[0].1 {
            return Err(CoreError::OffsetOutOfBounds { offset: pair[1].1, limit: bytes.len() as u32 });
        }
    }
    if let Some(&(_, last)) = offsets.last() {
        if last as usize > bytes.len() {
            return Err(CoreError::OffsetOutOfBounds { offset: last, limit: bytes.len() as u32 });
        }
    }

    for (idx, &(field_i, start)) in offsets.iter().enumerate() {
        let end = offsets.get(idx + 1).map_or(bytes.len(), |&(_, e)| e as usize);
        slots[field_i] = Some(FieldSlot::Variable(&bytes[start as usize..end]));
    }

    Ok(slots.into_iter().map(|s| s.expect("every field slot assigned in one of the two passes")).collect())
}

/// The dual of [`split_variable_container`]: given each field already
/// encoded, lay out the fixed part (inlining fixed fields, offset-pointing
/// to variable ones) followed by the variable bodies in field order.
pub enum FieldBytes {
    Fixed(Vec<u8>),
    Variable(Vec<u8>),
}

#[must_use]
pub fn encode_variable_container(fields: &[FieldBytes]) -> Vec<u8> {
    let fixed_part_len: usize = fields
        .iter()
        .map(|f| match f {
            FieldBytes::Fixed(b) => b.len(),
            FieldBytes::Variable(_) => 4,
        })
        .sum();

    let mut out = Vec::new();
    let mut offset = fixed_part_len as u32;
    let mut variable_bodies = Vec::new();
    for field in fields {
        match field {
            FieldBytes::Fixed(bytes) => out.extend_from_slice(bytes),
            FieldBytes::Variable(bytes) => {
                out.extend_from_slice(&offset.to_le_bytes());
                offset += bytes.len() as u32;
                variable_bodies.push(bytes);
            }
        }
    }
    for body in variable_bodies {
        out.extend_from_slice(body);
    }
    out
}

/// Generates `SimpleSerialize` and `Merkleize` for a container whose fields
/// are all fixed-size: plain concatenation for encoding, one chunk per
/// field (via `hash_tree_root`) for Merkleization (`spec.md §3`).
macro_rules! ssz_fixed_container {
    ($name:ident { $($field:ident : $ty:ty),+ $(,)? }) => {
        impl $crate::ssz::SimpleSerialize for $name {
            fn is_variable_size() -> bool {
                false
            }

            fn fixed_size() -> Option<usize> {
                let mut total = 0usize;
                $(total += <$ty as $crate::ssz::SimpleSerialize>::fixed_size().expect(
                    concat!(stringify!($field), " must be fixed-size in a fixed container")
                );)+
                Some(total)
            }

            fn serialized_size(&self) -> usize {
                Self::fixed_size().unwrap()
            }

            fn serialize(&self, out: &mut Vec<u8>) {
                $(self.$field.serialize(out);)+
            }

            fn deserialize(bytes: &[u8]) -> Result<Self, $crate::error::CoreError> {
                let expected = Self::fixed_size().unwrap();
                if bytes.len() < expected {
                    return Err($crate::error::CoreError::ShortInput { expected, got: bytes.len() });
                }
                if bytes.len() > expected {
                    return Err($crate::error::CoreError::TrailingBytes { expected, got: bytes.len() });
                }
                let mut cursor = 0usize;
                $(
                    let size = <$ty as $crate::ssz::SimpleSerialize>::fixed_size().unwrap();
                    let $field = <$ty as $crate::ssz::SimpleSerialize>::deserialize(&bytes[cursor..cursor + size])?;
                    cursor += size;
                )+
                Ok(Self { $($field),+ })
            }
        }

        impl $crate::ssz::container::Merkleize for $name {
            fn hash_tree_root(&self) -> $crate::primitives::Root {
                let roots = vec![
                    $($crate::ssz::container::Merkleize::hash_tree_root(&self.$field)),+
                ];
                $crate::merkleizer::merkleize_field_roots(&roots)
            }
        }
    };
}

pub(crate) use ssz_fixed_container;

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair {
        a: u64,
        b: u32,
    }
    ssz_fixed_container!(Pair { a: u64, b: u32 });

    #[test]
    fn fixed_container_roundtrip() {
        let p = Pair { a: 7, b: 9 };
        let bytes = p.to_ssz_bytes();
        assert_eq!(bytes.len(), 12);
        let back = Pair::deserialize(&bytes).unwrap();
        assert_eq!(back.a, 7);
        assert_eq!(back.b, 9);
    }

    #[test]
    fn fixed_container_root_is_field_tree() {
        let p = Pair { a: 7, b: 9 };
        let expected = merkleizer::merkleize_field_roots(&[
            Merkleize::hash_tree_root(&p.a),
            Merkleize::hash_tree_root(&p.b),
        ]);
        assert_eq!(p.hash_tree_root(), expected);
    }

    #[test]
    fn split_variable_container_resolves_mixed_fields() {
        // field 0: fixed u32 (4 bytes), field 1: variable (offset), field 2: fixed u8
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&42u32.to_le_bytes());
        let offset_pos = bytes.len();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.push(7u8);
        let fixed_len = bytes.len();
        bytes[offset_pos..offset_pos + 4].copy_from_slice(&(fixed_len as u32).to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3]);

        let slots = split_variable_container(&bytes, &[Some(4), None, Some(1)]).unwrap();
        assert!(matches!(slots[0], FieldSlot::Fixed(b) if b == [42, 0, 0, 0]));
        assert!(matches!(slots[1], FieldSlot::Variable(b) if b == [1, 2, 3]));
        assert!(matches!(slots[2], FieldSlot::Fixed(b) if b == [7]));
    }

    #[test]
    fn encode_then_split_variable_container_roundtrips() {
        let fields = vec![
            FieldBytes::Fixed(vec![1, 2, 3, 4]),
            FieldBytes::Variable(vec![9, 9, 9]),
            FieldBytes::Fixed(vec![5]),
        ];
        let bytes = encode_variable_container(&fields);
        let slots = split_variable_container(&bytes, &[Some(4), None, Some(1)]).unwrap();
        assert!(matches!(slots[0], FieldSlot::Fixed(b) if b == [1, 2, 3, 4]));
        assert!(matches!(slots[1], FieldSlot::Variable(b) if b == [9, 9, 9]));
        assert!(matches!(slots[2], FieldSlot::Fixed(b) if b == [5]));
    }

    #[test]
    fn rejects_non_monotonic_offsets() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend_from_slice(&4u32.to_le_bytes());
        let err = split_variable_container(&bytes, &[None, None]).unwrap_err();
        assert!(matches!(err, CoreError::OffsetOutOfBounds { .. }));
    }
}
