//! Fixed-size byte identifiers and small value types shared across the crate.

use crate::error::CoreError;
use crate::merkleizer;
use crate::ssz::SimpleSerialize;
use std::fmt;
use std::str::FromStr;

/// A 32-byte Merkle hash. The unit of identity for every commitment this
/// crate produces: a state root, a block root, a leaf, a sibling in a proof.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Root(pub [u8; 32]);

impl Root {
    pub const ZERO: Root = Root([0u8; 32]);

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Root {
    fn from(bytes: [u8; 32]) -> Self {
        Root(bytes)
    }
}

impl From<Root> for [u8; 32] {
    fn from(root: Root) -> Self {
        root.0
    }
}

impl AsRef<[u8]> for Root {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Root {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)
            .map_err(|e| CoreError::Internal(format!("invalid hex root: {e}")))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::Internal("root must be 32 bytes".to_string()))?;
        Ok(Root(arr))
    }
}

impl serde::Serialize for Root {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Root {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Root::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A 20-byte execution-layer account address, rendered on the wire the
/// same way as [`Root`] (`0x`-prefixed lowercase hex) but kept distinct so
/// call sites can't confuse a 32-byte commitment with a 20-byte account id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl serde::Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(stripped).map_err(serde::de::Error::custom)?;
        let arr: [u8; 20] =
            bytes.try_into().map_err(|_| serde::de::Error::custom("address must be 20 bytes"))?;
        Ok(Address(arr))
    }
}

/// A 4-byte fork-schema selector. Determines which gindices are valid
/// (`spec.md` GLOSSARY, "Fork version").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Version(pub [u8; 4]);

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 4]> for Version {
    fn from(bytes: [u8; 4]) -> Self {
        Version(bytes)
    }
}

macro_rules! newtype_u64 {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(v: u64) -> Self {
                $name(v)
            }
        }

        impl From<$name> for u64 {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

newtype_u64!(Slot);
newtype_u64!(Epoch);
newtype_u64!(ValidatorIndex);

/// `ForkData` as defined by the consensus spec: the container whose
/// hash-tree-root is mixed with a domain type to produce a signing domain.
/// BLS signing itself is out of scope (`spec.md §1`), but the root
/// computation is a pure Merkleization and belongs in Primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkData {
    pub current_version: Version,
    pub genesis_validators_root: Root,
}

impl ForkData {
    /// `hash_tree_root` of `{current_version, genesis_validators_root}`.
    #[must_use]
    pub fn compute_fork_data_root(&self) -> Root {
        let version_root = {
            let mut padded = [0u8; 32];
            padded[..4].copy_from_slice(&self.current_version.0);
            Root(padded)
        };
        merkleizer::merkleize_field_roots(&[version_root, self.genesis_validators_root])
    }
}

impl SimpleSerialize for Version {
    fn is_variable_size() -> bool {
        false
    }

    fn fixed_size() -> Option<usize> {
        Some(4)
    }

    fn serialized_size(&self) -> usize {
        4
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() < 4 {
            return Err(CoreError::ShortInput { expected: 4, got: bytes.len() });
        }
        if bytes.len() > 4 {
            return Err(CoreError::TrailingBytes { expected: 4, got: bytes.len() });
        }
        let mut arr = [0u8; 4];
        arr.copy_from_slice(bytes);
        Ok(Version(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_hex_roundtrip() {
        let root = Root([0xabu8; 32]);
        let s = root.to_string();
        assert_eq!(s, format!("0x{}", "ab".repeat(32)));
        let parsed: Root = s.parse().unwrap();
        assert_eq!(parsed, root);
    }

    #[test]
    fn root_json_roundtrip() {
        let root = Root([1u8; 32]);
        let json = serde_json::to_string(&root).unwrap();
        let back: Root = serde_json::from_str(&json).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn address_hex_roundtrip() {
        let addr = Address([0x42u8; 20]);
        let s = addr.to_string();
        assert_eq!(s, format!("0x{}", "42".repeat(20)));
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn fork_data_root_is_deterministic() {
        let fd = ForkData {
            current_version: Version([1, 2, 3, 4]),
            genesis_validators_root: Root([9u8; 32]),
        };
        assert_eq!(fd.compute_fork_data_root(), fd.compute_fork_data_root());
    }
}
