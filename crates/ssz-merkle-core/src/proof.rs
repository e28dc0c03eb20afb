//! Proof composition and verification (`spec.md §4.3`, `§6`).
//!
//! Every proof this crate hands out is produced by [`ProofComposer`], which
//! always self-checks the result (recomputes the root from `leaf` + `branch`
//! and cross-checks the gindex against [`GindexRegistry`]) before returning
//! it. A mismatch here means this crate's composer and its registry have
//! drifted apart — a bug, not a caller error — and surfaces as
//! [`CoreError::ProofSelfCheckFailed`] (`spec.md §9`, "verifying the proof
//! is not absolutely necessary" — the teacher's original TODO, resolved in
//! the other direction: self-verification stays mandatory).

use crate::error::CoreError;
use crate::gindex;
use crate::merkleizer;
use crate::primitives::{Root, Version};
use crate::registry::{ExecutionPayloadHeaderField, GindexRegistry, PendingConsolidationField, ValidatorField};
use crate::schema::{field_index, limits, BeaconBlockHeader, BeaconState};
use crate::ssz::collections::prove_list_element;
use crate::ssz::container::Merkleize;

/// A Merkle proof that `leaf` sits at `gindex` under `root`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Proof {
    pub leaf: Root,
    pub gindex: u64,
    pub branch: Vec<Root>,
    pub root: Root,
}

impl Proof {
    /// Recomputes `root` from `leaf`, `gindex`, and `branch` and compares
    /// (`spec.md §6`, "Verifier"). The sole externally meaningful check:
    /// callers never need anything but this boolean.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let (index, depth) = gindex::gindex_to_index(self.gindex);
        if self.branch.len() != depth as usize {
            return false;
        }
        merkleizer::apply_proof(self.leaf, index, &self.branch) == self.root
    }
}

/// Merge an `inner` proof (whose root is the single leaf an `outer` proof
/// addresses) into one proof from `inner.leaf` to `outer.root`
/// (`spec.md §4.3`, "Cross-container composition").
fn compose(inner: Proof, outer: Proof) -> Proof {
    debug_assert_eq!(inner.root, outer.leaf, "composed proofs must share a root/leaf boundary");
    let gindex = gindex::concat_gindices(outer.gindex, inner.gindex);
    let mut branch = inner.branch;
    branch.extend(outer.branch);
    Proof { leaf: inner.leaf, gindex, branch, root: outer.root }
}

fn self_check(proof: &Proof, expected_gindex: u64, fork: Version) -> Result<Proof, CoreError> {
    if proof.gindex != expected_gindex || !proof.is_valid() {
        return Err(CoreError::ProofSelfCheckFailed { gindex: expected_gindex, fork });
    }
    Ok(proof.clone())
}

/// Builds proofs against a [`BeaconState`] and, when composing into a
/// block, a [`BeaconBlockHeader`] (`spec.md §4.3`).
pub struct ProofComposer;

impl ProofComposer {
    /// Proof of a top-level state field (e.g. `state.slot`).
    pub fn prove_field_in_state(
        state: &BeaconState,
        field_index: usize,
        fork: Version,
    ) -> Result<Proof, CoreError> {
        let (leaf, branch, root) = state.prove_top_level_field(field_index);
        let expected = GindexRegistry::state_field(field_index)?;
        self_check(&Proof { leaf, gindex: expected, branch, root }, expected, fork)
    }

    /// Proof of `state.validators[validator_index].<field>`.
    pub fn prove_validator_field_in_state(
        state: &BeaconState,
        validator_index: usize,
        field: ValidatorField,
        fork: Version,
    ) -> Result<Proof, CoreError> {
        let validators = state.validators_slice();
        let validator = validators
            .get(validator_index)
            .ok_or_else(|| CoreError::FieldPathNotFound {
                path: format!("state.validators[{validator_index}]"),
            })?;

        let field_idx: usize = field.into();
        let (field_leaf, field_branch, validator_root) = validator.prove_field(field_idx);
        let field_gindex = gindex::index_to_gindex(field_idx, 3);
        let field_proof = Proof { leaf: field_leaf, gindex: field_gindex, branch: field_branch, root: validator_root };

        let (elem_leaf, elem_gindex, elem_branch, list_root) =
            prove_list_element(validators, limits::VALIDATOR_REGISTRY_LIMIT, validator_index)?;
        debug_assert_eq!(elem_leaf, validator_root);
        let elem_proof = Proof { leaf: elem_leaf, gindex: elem_gindex, branch: elem_branch, root: list_root };

        let (list_leaf, list_branch, state_root) = state.prove_top_level_field(field_index::VALIDATORS);
        debug_assert_eq!(list_leaf, list_root);
        let list_field_gindex = GindexRegistry::state_field(field_index::VALIDATORS)?;
        let list_field_proof = Proof { leaf: list_leaf, gindex: list_field_gindex, branch: list_branch, root: state_root };

        let composed = compose(compose(field_proof, elem_proof), list_field_proof);
        let expected = GindexRegistry::validator_field(validator_index, field)?;
        self_check(&composed, expected, fork)
    }

    /// Proof of `state.pending_consolidations[index].<field>`.
    pub fn prove_pending_consolidation_field_in_state(
        state: &BeaconState,
        index: usize,
        field: PendingConsolidationField,
        fork: Version,
    ) -> Result<Proof, CoreError> {
        let entries = state.pending_consolidations_slice();
        let entry = entries.get(index).ok_or_else(|| CoreError::FieldPathNotFound {
            path: format!("state.pending_consolidations[{index}]"),
        })?;

        let field_idx: usize = field.into();
        let (field_leaf, field_branch, entry_root) = entry.prove_field(field_idx);
        let field_gindex = gindex::index_to_gindex(field_idx, 1);
        let field_proof = Proof { leaf: field_leaf, gindex: field_gindex, branch: field_branch, root: entry_root };

        let (elem_leaf, elem_gindex, elem_branch, list_root) =
            prove_list_element(entries, limits::PENDING_CONSOLIDATIONS_LIMIT, index)?;
        debug_assert_eq!(elem_leaf, entry_root);
        let elem_proof = Proof { leaf: elem_leaf, gindex: elem_gindex, branch: elem_branch, root: list_root };

        let (list_leaf, list_branch, state_root) = state.prove_top_level_field(field_index::PENDING_CONSOLIDATIONS);
        debug_assert_eq!(list_leaf, list_root);
        let list_field_gindex = GindexRegistry::state_field(field_index::PENDING_CONSOLIDATIONS)?;
        let list_field_proof = Proof { leaf: list_leaf, gindex: list_field_gindex, branch: list_branch, root: state_root };

        let composed = compose(compose(field_proof, elem_proof), list_field_proof);
        let expected = GindexRegistry::pending_consolidation_field(index, field)?;
        self_check(&composed, expected, fork)
    }

    /// Proof of `state.latest_execution_payload_header.<field>`.
    pub fn prove_execution_payload_header_field_in_state(
        state: &BeaconState,
        field: ExecutionPayloadHeaderField,
        fork: Version,
    ) -> Result<Proof, CoreError> {
        let field_idx: usize = field.into();
        let header = &state.latest_execution_payload_header;
        let (field_leaf, field_branch, header_root) = header.prove_field(field_idx);
        let field_gindex = gindex::index_to_gindex(field_idx, 5);
        let field_proof = Proof { leaf: field_leaf, gindex: field_gindex, branch: field_branch, root: header_root };

        let (container_leaf, container_branch, state_root) =
            state.prove_top_level_field(field_index::LATEST_EXECUTION_PAYLOAD_HEADER);
        debug_assert_eq!(container_leaf, header_root);
        let container_gindex = GindexRegistry::state_field(field_index::LATEST_EXECUTION_PAYLOAD_HEADER)?;
        let container_proof =
            Proof { leaf: container_leaf, gindex: container_gindex, branch: container_branch, root: state_root };

        let composed = compose(field_proof, container_proof);
        let expected = GindexRegistry::execution_payload_header_field(field)?;
        self_check(&composed, expected, fork)
    }

    /// Proof that `state.hash_tree_root()` is `block.state_root`
    /// (`spec.md §4.3`, "state-in-block").
    pub fn prove_state_in_block(
        state: &BeaconState,
        block: &BeaconBlockHeader,
        fork: Version,
    ) -> Result<Proof, CoreError> {
        if block.state_root != state.hash_tree_root().into() {
            return Err(CoreError::Internal(
                "block.state_root does not match the supplied state's hash_tree_root".to_string(),
            ));
        }
        let (leaf, branch, root) = block.prove_field(3);
        let gindex = GindexRegistry::block_header_state_root();
        self_check(&Proof { leaf, gindex, branch, root }, gindex, fork)
    }

    /// Composes any `field-in-state` proof with a `state-in-block` proof to
    /// produce a single proof rooted at the block.
    pub fn prove_field_in_block(
        state_proof: Proof,
        state_in_block: Proof,
        fork: Version,
    ) -> Result<Proof, CoreError> {
        let expected = gindex::concat_gindices(state_in_block.gindex, state_proof.gindex);
        let composed = compose(state_proof, state_in_block);
        self_check(&composed, expected, fork)
    }
}

impl From<ValidatorField> for usize {
    fn from(value: ValidatorField) -> Self {
        match value {
            ValidatorField::Pubkey => 0,
            ValidatorField::WithdrawalCredentials => 1,
            ValidatorField::EffectiveBalance => 2,
            ValidatorField::Slashed => 3,
            ValidatorField::ActivationEligibilityEpoch => 4,
            ValidatorField::ActivationEpoch => 5,
            ValidatorField::ExitEpoch => 6,
            ValidatorField::WithdrawableEpoch => 7,
        }
    }
}

impl From<PendingConsolidationField> for usize {
    fn from(value: PendingConsolidationField) -> Self {
        match value {
            PendingConsolidationField::SourceIndex => 0,
            PendingConsolidationField::TargetIndex => 1,
        }
    }
}

impl From<ExecutionPayloadHeaderField> for usize {
    fn from(value: ExecutionPayloadHeaderField) -> Self {
        match value {
            ExecutionPayloadHeaderField::ParentHash => 0,
            ExecutionPayloadHeaderField::FeeRecipient => 1,
            ExecutionPayloadHeaderField::StateRoot => 2,
            ExecutionPayloadHeaderField::ReceiptsRoot => 3,
            ExecutionPayloadHeaderField::LogsBloom => 4,
            ExecutionPayloadHeaderField::PrevRandao => 5,
            ExecutionPayloadHeaderField::BlockNumber => 6,
            ExecutionPayloadHeaderField::GasLimit => 7,
            ExecutionPayloadHeaderField::GasUsed => 8,
            ExecutionPayloadHeaderField::Timestamp => 9,
            ExecutionPayloadHeaderField::ExtraData => 10,
            ExecutionPayloadHeaderField::BaseFeePerGas => 11,
            ExecutionPayloadHeaderField::BlockHash => 12,
            ExecutionPayloadHeaderField::TransactionsRoot => 13,
            ExecutionPayloadHeaderField::WithdrawalsRoot => 14,
            ExecutionPayloadHeaderField::BlobGasUsed => 15,
            ExecutionPayloadHeaderField::ExcessBlobGas => 16,
        }
    }
}
