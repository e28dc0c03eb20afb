//! The storage-agnostic façade a transport layer calls into
//! (`spec.md §5`, "Query API"). [`StateStore`] is the one trait-object seam
//! in this crate — everything else here is resolved at compile time.

use crate::error::CoreError;
use crate::primitives::{Root, Slot, Version};
use crate::proof::{Proof, ProofComposer};
use crate::registry::{ExecutionPayloadHeaderField, PendingConsolidationField, ValidatorField};
use crate::schema::{field_index, BeaconBlockHeader, BeaconState};
use std::str::FromStr;
use std::sync::Arc;

/// How a caller names the block/state they want a proof against
/// (`spec.md §5`, "BlockId").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockId {
    Head,
    Genesis,
    Finalized,
    Justified,
    Slot(u64),
    Root(Root),
}

impl FromStr for BlockId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head" => Ok(Self::Head),
            "genesis" => Ok(Self::Genesis),
            "finalized" => Ok(Self::Finalized),
            "justified" => Ok(Self::Justified),
            _ if s.starts_with("0x") => s.parse::<Root>().map(Self::Root),
            _ => s
                .parse::<u64>()
                .map(Self::Slot)
                .map_err(|_| CoreError::NotFound { block_id: s.to_string() }),
        }
    }
}

/// The one pluggable dependency: where beacon states and headers come
/// from. Implementations live in a separate crate so this one stays free
/// of any particular transport (`spec.md §5`).
pub trait StateStore: Send + Sync {
    fn state_at_slot(&self, block_id: BlockId) -> Result<(BeaconState, Version), CoreError>;
    fn header_at_slot(&self, block_id: BlockId) -> Result<BeaconBlockHeader, CoreError>;
    fn slot_of(&self, block_id: BlockId) -> Result<Slot, CoreError>;
}

/// Resolves a [`BlockId`] to state and proves against it. The only type in
/// this crate that holds a trait object, since the backing store is the
/// one thing callers genuinely need to swap at runtime.
pub struct QueryApi {
    store: Arc<dyn StateStore>,
}

impl QueryApi {
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Proof of a named top-level state field, by path string (e.g. `"slot"`).
    pub fn prove_state_field(&self, block_id: BlockId, path: &str) -> Result<Proof, CoreError> {
        let (state, fork) = self.store.state_at_slot(block_id)?;
        let idx = top_level_field_index(path)?;
        ProofComposer::prove_field_in_state(&state, idx, fork)
    }

    /// Proof of `validators[validator_index].<field>`.
    pub fn prove_validator_field(
        &self,
        block_id: BlockId,
        validator_index: usize,
        field: ValidatorField,
    ) -> Result<Proof, CoreError> {
        let (state, fork) = self.store.state_at_slot(block_id)?;
        ProofComposer::prove_validator_field_in_state(&state, validator_index, field, fork)
    }

    /// Proof of `pending_consolidations[index].<field>`.
    pub fn prove_pending_consolidation_field(
        &self,
        block_id: BlockId,
        index: usize,
        field: PendingConsolidationField,
    ) -> Result<Proof, CoreError> {
        let (state, fork) = self.store.state_at_slot(block_id)?;
        ProofComposer::prove_pending_consolidation_field_in_state(&state, index, field, fork)
    }

    /// Proof of `latest_execution_payload_header.fee_recipient`.
    pub fn prove_execution_fee_recipient(&self, block_id: BlockId) -> Result<Proof, CoreError> {
        let (state, fork) = self.store.state_at_slot(block_id)?;
        ProofComposer::prove_execution_payload_header_field_in_state(
            &state,
            ExecutionPayloadHeaderField::FeeRecipient,
            fork,
        )
    }

    /// Proof of `latest_execution_payload_header.block_number`.
    pub fn prove_execution_block_number(&self, block_id: BlockId) -> Result<Proof, CoreError> {
        let (state, fork) = self.store.state_at_slot(block_id)?;
        ProofComposer::prove_execution_payload_header_field_in_state(
            &state,
            ExecutionPayloadHeaderField::BlockNumber,
            fork,
        )
    }

    /// Any `field-in-state` proof, re-rooted at the enclosing block.
    pub fn prove_field_in_block(&self, block_id: BlockId, state_proof: Proof) -> Result<Proof, CoreError> {
        let (state, fork) = self.store.state_at_slot(block_id)?;
        let header = self.store.header_at_slot(block_id)?;
        let state_in_block = ProofComposer::prove_state_in_block(&state, &header, fork)?;
        ProofComposer::prove_field_in_block(state_proof, state_in_block, fork)
    }

    /// Proof of `latest_execution_payload_header.fee_recipient`, re-rooted at
    /// the enclosing block, alongside the recipient's actual value. Fetches
    /// state and header exactly once rather than composing
    /// [`Self::prove_execution_fee_recipient`] with [`Self::prove_field_in_block`]
    /// (`spec.md §6`, the HTTP surface needs the value, not just the proof).
    pub fn prove_execution_fee_recipient_in_block(
        &self,
        block_id: BlockId,
    ) -> Result<(Proof, crate::primitives::Address), CoreError> {
        let (state, fork) = self.store.state_at_slot(block_id)?;
        let header = self.store.header_at_slot(block_id)?;
        let fee_recipient = state.latest_execution_payload_header.fee_recipient;
        let field_proof = ProofComposer::prove_execution_payload_header_field_in_state(
            &state,
            ExecutionPayloadHeaderField::FeeRecipient,
            fork,
        )?;
        let state_in_block = ProofComposer::prove_state_in_block(&state, &header, fork)?;
        let proof = ProofComposer::prove_field_in_block(field_proof, state_in_block, fork)?;
        Ok((proof, fee_recipient.into()))
    }

    /// Proof of `latest_execution_payload_header.block_number`, re-rooted at
    /// the enclosing block, alongside the actual block number.
    pub fn prove_execution_block_number_in_block(
        &self,
        block_id: BlockId,
    ) -> Result<(Proof, u64), CoreError> {
        let (state, fork) = self.store.state_at_slot(block_id)?;
        let header = self.store.header_at_slot(block_id)?;
        let block_number = state.latest_execution_payload_header.block_number;
        let field_proof = ProofComposer::prove_execution_payload_header_field_in_state(
            &state,
            ExecutionPayloadHeaderField::BlockNumber,
            fork,
        )?;
        let state_in_block = ProofComposer::prove_state_in_block(&state, &header, fork)?;
        let proof = ProofComposer::prove_field_in_block(field_proof, state_in_block, fork)?;
        Ok((proof, block_number))
    }
}

fn top_level_field_index(path: &str) -> Result<usize, CoreError> {
    use field_index::*;
    let idx = match path {
        "genesis_time" => GENESIS_TIME,
        "genesis_validators_root" => GENESIS_VALIDATORS_ROOT,
        "slot" => SLOT,
        "fork" => FORK,
        "latest_block_header" => LATEST_BLOCK_HEADER,
        "eth1_data" => ETH1_DATA,
        "eth1_deposit_index" => ETH1_DEPOSIT_INDEX,
        "validators" => VALIDATORS,
        "balances" => BALANCES,
        "next_withdrawal_index" => NEXT_WITHDRAWAL_INDEX,
        "next_withdrawal_validator_index" => NEXT_WITHDRAWAL_VALIDATOR_INDEX,
        "finalized_checkpoint" => FINALIZED_CHECKPOINT,
        "current_justified_checkpoint" => CURRENT_JUSTIFIED_CHECKPOINT,
        "previous_justified_checkpoint" => PREVIOUS_JUSTIFIED_CHECKPOINT,
        "latest_execution_payload_header" => LATEST_EXECUTION_PAYLOAD_HEADER,
        "pending_consolidations" => PENDING_CONSOLIDATIONS,
        "pending_deposits" => PENDING_DEPOSITS,
        "pending_partial_withdrawals" => PENDING_PARTIAL_WITHDRAWALS,
        other => return Err(CoreError::FieldPathNotFound { path: other.to_string() }),
    };
    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStore {
        state: BeaconState,
        header: BeaconBlockHeader,
        fork: Version,
    }

    impl StateStore for FixedStore {
        fn state_at_slot(&self, _block_id: BlockId) -> Result<(BeaconState, Version), CoreError> {
            Ok((self.state.clone(), self.fork))
        }

        fn header_at_slot(&self, _block_id: BlockId) -> Result<BeaconBlockHeader, CoreError> {
            Ok(self.header.clone())
        }

        fn slot_of(&self, _block_id: BlockId) -> Result<Slot, CoreError> {
            Ok(Slot(self.state.slot))
        }
    }

    fn store_with_state_root_linked() -> FixedStore {
        use crate::ssz::container::Merkleize;
        let state = BeaconState::default();
        let mut header = BeaconBlockHeader::default();
        header.state_root = state.hash_tree_root().into();
        FixedStore { state, header, fork: Version([0; 4]) }
    }

    #[test]
    fn block_id_parses_named_variants() {
        assert_eq!("head".parse::<BlockId>().unwrap(), BlockId::Head);
        assert_eq!("123".parse::<BlockId>().unwrap(), BlockId::Slot(123));
        assert!("not-a-block".parse::<BlockId>().is_err());
    }

    #[test]
    fn query_api_proves_top_level_field_by_path() {
        let store = Arc::new(store_with_state_root_linked());
        let api = QueryApi::new(store);
        let proof = api.prove_state_field(BlockId::Head, "slot").unwrap();
        assert!(proof.is_valid());
    }

    #[test]
    fn query_api_rejects_unknown_path() {
        let store = Arc::new(store_with_state_root_linked());
        let api = QueryApi::new(store);
        let err = api.prove_state_field(BlockId::Head, "not_a_field").unwrap_err();
        assert!(matches!(err, CoreError::FieldPathNotFound { .. }));
    }

    #[test]
    fn query_api_proves_execution_fee_recipient_and_block_number() {
        use crate::ssz::container::Merkleize;
        let mut state = BeaconState::default();
        state.latest_execution_payload_header.fee_recipient = [0x42; 20];
        let mut header = BeaconBlockHeader::default();
        header.state_root = state.hash_tree_root().into();
        let store = Arc::new(FixedStore { state, header, fork: Version([0; 4]) });
        let api = QueryApi::new(store);

        let fee_recipient_proof = api.prove_execution_fee_recipient(BlockId::Head).unwrap();
        assert!(fee_recipient_proof.is_valid());

        let block_number_proof = api.prove_execution_block_number(BlockId::Head).unwrap();
        assert!(block_number_proof.is_valid());
        assert_ne!(block_number_proof.gindex, fee_recipient_proof.gindex);
    }

    #[test]
    fn query_api_composes_field_in_block() {
        let store = Arc::new(store_with_state_root_linked());
        let api = QueryApi::new(store);
        let state_proof = api.prove_state_field(BlockId::Head, "slot").unwrap();
        let block_proof = api.prove_field_in_block(BlockId::Head, state_proof).unwrap();
        assert!(block_proof.is_valid());
    }
}
