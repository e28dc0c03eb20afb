//! An in-memory `StateStore` over a fixed set of named snapshots, for tests
//! and for the fixture-generation binary in `proof-fixtures`.

use ssz_merkle_core::error::CoreError;
use ssz_merkle_core::primitives::{Slot, Version};
use ssz_merkle_core::query::{BlockId, StateStore};
use ssz_merkle_core::schema::{BeaconBlockHeader, BeaconState};
use ssz_merkle_core::ssz::Merkleize;
use std::collections::HashMap;

/// One (state, header, fork) triple a `FixtureBeaconStore` can serve.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: BeaconState,
    pub header: BeaconBlockHeader,
    pub fork: Version,
}

impl Snapshot {
    /// Builds a snapshot whose header's `state_root` is linked to `state`,
    /// as a real chain would produce.
    #[must_use]
    pub fn linked(state: BeaconState, fork: Version) -> Self {
        let mut header = BeaconBlockHeader { slot: state.slot, ..BeaconBlockHeader::default() };
        header.state_root = state.hash_tree_root().into();
        Self { state, header, fork }
    }
}

/// A `StateStore` over snapshots keyed by slot, with `head` resolving to the
/// highest slot present. Named identifiers (`genesis`, `finalized`,
/// `justified`) and root lookups are not modeled; callers needing those
/// should use [`BlockId::Slot`].
pub struct FixtureBeaconStore {
    by_slot: HashMap<u64, Snapshot>,
    head_slot: u64,
}

impl FixtureBeaconStore {
    #[must_use]
    pub fn single(snapshot: Snapshot) -> Self {
        let head_slot = snapshot.state.slot;
        let mut by_slot = HashMap::new();
        by_slot.insert(head_slot, snapshot);
        Self { by_slot, head_slot }
    }

    #[must_use]
    pub fn from_snapshots(snapshots: Vec<Snapshot>) -> Self {
        let head_slot = snapshots.iter().map(|s| s.state.slot).max().unwrap_or(0);
        let by_slot = snapshots.into_iter().map(|s| (s.state.slot, s)).collect();
        Self { by_slot, head_slot }
    }

    fn resolve(&self, block_id: BlockId) -> Result<&Snapshot, CoreError> {
        let slot = match block_id {
            BlockId::Head | BlockId::Finalized | BlockId::Justified | BlockId::Genesis => self.head_slot,
            BlockId::Slot(slot) => slot,
            BlockId::Root(root) => {
                return self
                    .by_slot
                    .values()
                    .find(|s| s.header.hash_tree_root() == root)
                    .ok_or_else(|| CoreError::NotFound { block_id: root.to_string() });
            }
        };
        self.by_slot.get(&slot).ok_or(CoreError::StateUnavailable { slot })
    }
}

impl StateStore for FixtureBeaconStore {
    fn state_at_slot(&self, block_id: BlockId) -> Result<(BeaconState, Version), CoreError> {
        self.resolve(block_id).map(|s| (s.state.clone(), s.fork))
    }

    fn header_at_slot(&self, block_id: BlockId) -> Result<BeaconBlockHeader, CoreError> {
        self.resolve(block_id).map(|s| s.header.clone())
    }

    fn slot_of(&self, block_id: BlockId) -> Result<Slot, CoreError> {
        self.resolve(block_id).map(|s| Slot(s.state.slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_resolves_to_highest_populated_slot() {
        let a = Snapshot::linked(BeaconState { slot: 10, ..BeaconState::default() }, Version([0; 4]));
        let b = Snapshot::linked(BeaconState { slot: 20, ..BeaconState::default() }, Version([0; 4]));
        let store = FixtureBeaconStore::from_snapshots(vec![a, b]);
        let (state, _) = store.state_at_slot(BlockId::Head).unwrap();
        assert_eq!(state.slot, 20);
    }

    #[test]
    fn missing_slot_is_state_unavailable() {
        let store = FixtureBeaconStore::single(Snapshot::linked(BeaconState::default(), Version([0; 4])));
        let err = store.state_at_slot(BlockId::Slot(999)).unwrap_err();
        assert!(matches!(err, CoreError::StateUnavailable { slot: 999 }));
    }

    #[test]
    fn header_and_state_roots_are_linked() {
        let state = BeaconState { slot: 5, ..BeaconState::default() };
        let store = FixtureBeaconStore::single(Snapshot::linked(state.clone(), Version([0; 4])));
        let header = store.header_at_slot(BlockId::Slot(5)).unwrap();
        assert_eq!(header.state_root, <[u8; 32]>::from(state.hash_tree_root()));
    }
}
