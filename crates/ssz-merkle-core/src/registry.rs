//! Known field paths and their generalized indices, computed once from the
//! schema's declared capacities rather than walked at request time
//! (`spec.md §4.3`, "Gindex Registry"). Mirrors the teacher's
//! `GindexCalculator`: every path this crate serves has a hardcoded
//! formula here, not a generic reflection-driven path resolver.

use crate::error::CoreError;
use crate::gindex;
use crate::schema::{field_index, limits};

/// A field inside a `Validator` record, addressed by the same order the
/// container declares them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorField {
    Pubkey,
    WithdrawalCredentials,
    EffectiveBalance,
    Slashed,
    ActivationEligibilityEpoch,
    ActivationEpoch,
    ExitEpoch,
    WithdrawableEpoch,
}

impl ValidatorField {
    const fn field_index(self) -> usize {
        match self {
            Self::Pubkey => 0,
            Self::WithdrawalCredentials => 1,
            Self::EffectiveBalance => 2,
            Self::Slashed => 3,
            Self::ActivationEligibilityEpoch => 4,
            Self::ActivationEpoch => 5,
            Self::ExitEpoch => 6,
            Self::WithdrawableEpoch => 7,
        }
    }
}

const VALIDATOR_FIELD_COUNT: usize = 8;
const VALIDATOR_FIELD_DEPTH: u32 = 3; // ceil_log2(8)

/// A field inside a `PendingConsolidation` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingConsolidationField {
    SourceIndex,
    TargetIndex,
}

impl PendingConsolidationField {
    const fn field_index(self) -> usize {
        match self {
            Self::SourceIndex => 0,
            Self::TargetIndex => 1,
        }
    }
}

const PENDING_CONSOLIDATION_FIELD_COUNT: usize = 2;
const PENDING_CONSOLIDATION_FIELD_DEPTH: u32 = 1; // ceil_log2(2)

/// A field inside the execution payload header embedded in the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPayloadHeaderField {
    ParentHash,
    FeeRecipient,
    StateRoot,
    ReceiptsRoot,
    LogsBloom,
    PrevRandao,
    BlockNumber,
    GasLimit,
    GasUsed,
    Timestamp,
    ExtraData,
    BaseFeePerGas,
    BlockHash,
    TransactionsRoot,
    WithdrawalsRoot,
    BlobGasUsed,
    ExcessBlobGas,
}

impl ExecutionPayloadHeaderField {
    const fn field_index(self) -> usize {
        match self {
            Self::ParentHash => 0,
            Self::FeeRecipient => 1,
            Self::StateRoot => 2,
            Self::ReceiptsRoot => 3,
            Self::LogsBloom => 4,
            Self::PrevRandao => 5,
            Self::BlockNumber => 6,
            Self::GasLimit => 7,
            Self::GasUsed => 8,
            Self::Timestamp => 9,
            Self::ExtraData => 10,
            Self::BaseFeePerGas => 11,
            Self::BlockHash => 12,
            Self::TransactionsRoot => 13,
            Self::WithdrawalsRoot => 14,
            Self::BlobGasUsed => 15,
            Self::ExcessBlobGas => 16,
        }
    }
}

const EXECUTION_PAYLOAD_HEADER_FIELD_COUNT: usize = 17;
const EXECUTION_PAYLOAD_HEADER_FIELD_DEPTH: u32 = 5; // ceil_log2(17)

/// `BeaconState` has 37 fields; its field tree has depth `ceil_log2(37) == 6`.
const STATE_FIELD_DEPTH: u32 = 6;

/// Gindex of the `data_root` child of a list's own root (the list root is
/// `hash(data_root, length)`; `data_root` is always child 0).
fn list_data_root_gindex(list_field_gindex: u64) -> u64 {
    gindex::concat_gindices(list_field_gindex, gindex::index_to_gindex(0, 1))
}

/// Known gindex formulas this crate can evaluate without walking an actual
/// tree. Each variant names one of the field paths the proof composer
/// supports (`spec.md §4.3`).
pub struct GindexRegistry;

impl GindexRegistry {
    /// Gindex of a top-level `BeaconState` field.
    pub fn state_field(field_index: usize) -> Result<u64, CoreError> {
        if field_index >= field_index::FIELD_COUNT {
            return Err(CoreError::FieldPathNotFound { path: format!("state.field[{field_index}]") });
        }
        Ok(gindex::index_to_gindex(field_index, STATE_FIELD_DEPTH))
    }

    /// Gindex of `state.validators[validator_index].<field>`.
    pub fn validator_field(validator_index: usize, field: ValidatorField) -> Result<u64, CoreError> {
        if validator_index >= limits::VALIDATOR_REGISTRY_LIMIT {
            return Err(CoreError::FieldPathNotFound {
                path: format!("state.validators[{validator_index}]"),
            });
        }
        let list_field_gindex = Self::state_field(field_index::VALIDATORS)?;
        let data_root_gindex = list_data_root_gindex(list_field_gindex);
        let element_depth = limits::VALIDATOR_REGISTRY_LIMIT.trailing_zeros();
        let element_gindex = gindex::concat_gindices(
            data_root_gindex,
            gindex::index_to_gindex(validator_index, element_depth),
        );
        let field_gindex = gindex::index_to_gindex(field.field_index(), VALIDATOR_FIELD_DEPTH);
        debug_assert_eq!(VALIDATOR_FIELD_COUNT, 8);
        Ok(gindex::concat_gindices(element_gindex, field_gindex))
    }

    /// Gindex of `state.pending_consolidations[index].<field>`.
    pub fn pending_consolidation_field(
        index: usize,
        field: PendingConsolidationField,
    ) -> Result<u64, CoreError> {
        if index >= limits::PENDING_CONSOLIDATIONS_LIMIT {
            return Err(CoreError::FieldPathNotFound {
                path: format!("state.pending_consolidations[{index}]"),
            });
        }
        let list_field_gindex = Self::state_field(field_index::PENDING_CONSOLIDATIONS)?;
        let data_root_gindex = list_data_root_gindex(list_field_gindex);
        let element_depth = limits::PENDING_CONSOLIDATIONS_LIMIT.trailing_zeros();
        let element_gindex = gindex::concat_gindices(
            data_root_gindex,
            gindex::index_to_gindex(index, element_depth),
        );
        let field_gindex =
            gindex::index_to_gindex(field.field_index(), PENDING_CONSOLIDATION_FIELD_DEPTH);
        debug_assert_eq!(PENDING_CONSOLIDATION_FIELD_COUNT, 2);
        Ok(gindex::concat_gindices(element_gindex, field_gindex))
    }

    /// Gindex of `state.latest_execution_payload_header.<field>`.
    pub fn execution_payload_header_field(field: ExecutionPayloadHeaderField) -> Result<u64, CoreError> {
        let container_gindex = Self::state_field(field_index::LATEST_EXECUTION_PAYLOAD_HEADER)?;
        let field_gindex =
            gindex::index_to_gindex(field.field_index(), EXECUTION_PAYLOAD_HEADER_FIELD_DEPTH);
        debug_assert_eq!(EXECUTION_PAYLOAD_HEADER_FIELD_COUNT, 17);
        Ok(gindex::concat_gindices(container_gindex, field_gindex))
    }

    /// Gindex of `BeaconBlockHeader.state_root`, used when composing a
    /// field-in-state proof into a field-in-block proof.
    pub fn block_header_state_root() -> u64 {
        // BeaconBlockHeader: slot, proposer_index, parent_root, state_root, body_root
        // 5 fields -> depth 3, state_root is field index 3.
        gindex::index_to_gindex(3, 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_field_gindex_matches_depth_six_tree() {
        let g = GindexRegistry::state_field(field_index::SLOT).unwrap();
        assert_eq!(gindex::gindex_depth(g), STATE_FIELD_DEPTH);
        assert_eq!(gindex::gindex_to_index(g), (field_index::SLOT, STATE_FIELD_DEPTH));
    }

    #[test]
    fn state_field_rejects_out_of_range_index() {
        assert!(GindexRegistry::state_field(field_index::FIELD_COUNT).is_err());
    }

    #[test]
    fn validator_field_gindex_has_expected_total_depth() {
        let g = GindexRegistry::validator_field(0, ValidatorField::WithdrawalCredentials).unwrap();
        let expected_depth = STATE_FIELD_DEPTH + 1 + 40 + VALIDATOR_FIELD_DEPTH;
        assert_eq!(gindex::gindex_depth(g), expected_depth);
    }

    #[test]
    fn pending_consolidation_field_gindex_has_expected_total_depth() {
        let g = GindexRegistry::pending_consolidation_field(0, PendingConsolidationField::SourceIndex)
            .unwrap();
        let expected_depth = STATE_FIELD_DEPTH + 1 + 18 + PENDING_CONSOLIDATION_FIELD_DEPTH;
        assert_eq!(gindex::gindex_depth(g), expected_depth);
    }

    #[test]
    fn execution_payload_header_field_gindex_has_expected_total_depth() {
        let g = GindexRegistry::execution_payload_header_field(ExecutionPayloadHeaderField::FeeRecipient)
            .unwrap();
        let expected_depth = STATE_FIELD_DEPTH + EXECUTION_PAYLOAD_HEADER_FIELD_DEPTH;
        assert_eq!(gindex::gindex_depth(g), expected_depth);
    }

    #[test]
    fn different_validator_indices_yield_different_gindices() {
        let g0 = GindexRegistry::validator_field(0, ValidatorField::ActivationEpoch).unwrap();
        let g1 = GindexRegistry::validator_field(1, ValidatorField::ActivationEpoch).unwrap();
        assert_ne!(g0, g1);
    }
}
