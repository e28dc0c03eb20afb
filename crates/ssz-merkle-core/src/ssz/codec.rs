//! The SSZ wire codec: `encode` / `decode` / `size` (`spec.md §4.1`).
//!
//! `SimpleSerialize` is implemented by hand for every type this crate needs,
//! rather than generated by a derive macro or discovered by reflection — the
//! Merkleizer (`crate::merkleizer`) walks the same field order this trait
//! encodes in, so the two must never drift apart (`spec.md §9`, "replace
//! runtime reflection... with a derived, schema-aware visitor").

use crate::error::CoreError;

/// Deterministic SSZ (de)serialization for a single type.
///
/// `is_variable_size`/`fixed_size` are properties of the *type*, not a
/// particular value — they decide whether a container treats this field as
/// an inline fixed-size field or an offset-addressed variable field.
pub trait SimpleSerialize: Sized {
    /// Whether the encoded length of a value of this type can vary.
    fn is_variable_size() -> bool;

    /// The encoded length for fixed-size types; `None` for variable-size types.
    fn fixed_size() -> Option<usize>;

    /// The byte length of `self`'s encoding, without allocating (`spec.md §4.1`, `size`).
    fn serialized_size(&self) -> usize;

    /// Append the canonical SSZ encoding of `self` to `out`.
    fn serialize(&self, out: &mut Vec<u8>);

    /// Convenience wrapper returning a fresh buffer.
    fn to_ssz_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_size());
        self.serialize(&mut out);
        out
    }

    /// Decode a value of this type from an exact-length buffer. For
    /// fixed-size types `bytes` must be exactly `fixed_size()`; for
    /// variable-size types it is exactly the body assigned to this field
    /// (the container has already resolved offsets).
    fn deserialize(bytes: &[u8]) -> Result<Self, CoreError>;
}

macro_rules! impl_ssz_uint {
    ($ty:ty, $size:expr) => {
        impl SimpleSerialize for $ty {
            fn is_variable_size() -> bool {
                false
            }

            fn fixed_size() -> Option<usize> {
                Some($size)
            }

            fn serialized_size(&self) -> usize {
                $size
            }

            fn serialize(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn deserialize(bytes: &[u8]) -> Result<Self, CoreError> {
                if bytes.len() < $size {
                    return Err(CoreError::ShortInput { expected: $size, got: bytes.len() });
                }
                if bytes.len() > $size {
                    return Err(CoreError::TrailingBytes { expected: $size, got: bytes.len() });
                }
                let mut arr = [0u8; $size];
                arr.copy_from_slice(bytes);
                Ok(<$ty>::from_le_bytes(arr))
            }
        }
    };
}

impl_ssz_uint!(u8, 1);
impl_ssz_uint!(u16, 2);
impl_ssz_uint!(u32, 4);
impl_ssz_uint!(u64, 8);
impl_ssz_uint!(u128, 16);

impl SimpleSerialize for bool {
    fn is_variable_size() -> bool {
        false
    }

    fn fixed_size() -> Option<usize> {
        Some(1)
    }

    fn serialized_size(&self) -> usize {
        1
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() < 1 {
            return Err(CoreError::ShortInput { expected: 1, got: bytes.len() });
        }
        if bytes.len() > 1 {
            return Err(CoreError::TrailingBytes { expected: 1, got: bytes.len() });
        }
        match bytes[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CoreError::Internal(format!("invalid bool byte: {other}"))),
        }
    }
}

impl<const N: usize> SimpleSerialize for [u8; N] {
    fn is_variable_size() -> bool {
        false
    }

    fn fixed_size() -> Option<usize> {
        Some(N)
    }

    fn serialized_size(&self) -> usize {
        N
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() < N {
            return Err(CoreError::ShortInput { expected: N, got: bytes.len() });
        }
        if bytes.len() > N {
            return Err(CoreError::TrailingBytes { expected: N, got: bytes.len() });
        }
        let mut arr = [0u8; N];
        arr.copy_from_slice(bytes);
        Ok(arr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_roundtrip() {
        let v: u64 = 0x0102_0304_0506_0708;
        let bytes = v.to_ssz_bytes();
        assert_eq!(bytes, vec![0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(u64::deserialize(&bytes).unwrap(), v);
    }

    #[test]
    fn u64_short_input() {
        let err = u64::deserialize(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, CoreError::ShortInput { expected: 8, got: 3 }));
    }

    #[test]
    fn u64_trailing_bytes() {
        let err = u64::deserialize(&[0; 9]).unwrap_err();
        assert!(matches!(err, CoreError::TrailingBytes { expected: 8, got: 9 }));
    }

    #[test]
    fn bool_roundtrip() {
        assert_eq!(bool::deserialize(&true.to_ssz_bytes()).unwrap(), true);
        assert_eq!(bool::deserialize(&false.to_ssz_bytes()).unwrap(), false);
    }

    #[test]
    fn fixed_array_roundtrip() {
        let arr: [u8; 4] = [9, 8, 7, 6];
        let bytes = arr.to_ssz_bytes();
        assert_eq!(bytes, vec![9, 8, 7, 6]);
        assert_eq!(<[u8; 4]>::deserialize(&bytes).unwrap(), arr);
    }
}
