//! SSZ codec, Merkleizer, gindex registry, and self-verifying proof
//! composer for beacon-chain state/block commitments (`spec.md §1`).
//!
//! Layering, innermost first: [`ssz`] (encode/decode + bounded
//! collections) → [`merkleizer`] (hashing) → [`gindex`] (path arithmetic)
//! → [`schema`] (the concrete containers) → [`registry`] (known gindex
//! formulas) → [`proof`] (composition + self-check) → [`query`] (the
//! storage-agnostic façade a transport crate drives).

pub mod error;
pub mod gindex;
pub mod merkleizer;
pub mod primitives;
pub mod proof;
pub mod query;
pub mod registry;
pub mod schema;
pub mod ssz;

pub use error::CoreError;
pub use primitives::{Address, Epoch, ForkData, Root, Slot, ValidatorIndex, Version};
pub use proof::{Proof, ProofComposer};
pub use query::{BlockId, QueryApi, StateStore};
pub use registry::{GindexRegistry, PendingConsolidationField, ValidatorField};
pub use schema::BeaconState;
pub use ssz::{List, Merkleize, SimpleSerialize, Vector};
