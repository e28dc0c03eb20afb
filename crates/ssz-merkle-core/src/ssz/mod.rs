//! SSZ encoding primitives: scalar codec, container support, and bounded
//! collections (`spec.md §4.1`, `§4.2`).

pub mod codec;
pub mod collections;
pub mod container;

pub use codec::SimpleSerialize;
pub use collections::{List, Vector};
pub use container::Merkleize;
pub(crate) use container::ssz_fixed_container;
