//! End-to-end coverage across `ssz-merkle-core` and `beacon-store`: a
//! synthetic chain is built once per test and driven entirely through the
//! public `QueryApi`/`StateStore` seam, the same way `proof-service`'s
//! handlers do.

use beacon_store::fixture_store::{FixtureBeaconStore, Snapshot};
use ssz_merkle_core::primitives::Version;
use ssz_merkle_core::query::{BlockId, QueryApi};
use ssz_merkle_core::registry::{PendingConsolidationField, ValidatorField};
use ssz_merkle_core::schema::{field_index, BeaconState, PendingConsolidation, Validator};
use ssz_merkle_core::{CoreError, Merkleize};
use std::sync::Arc;

fn populated_state() -> BeaconState {
    let mut state = BeaconState { slot: 4_000_000, ..BeaconState::default() };
    state.latest_execution_payload_header.fee_recipient = [0x11; 20];
    state.latest_execution_payload_header.block_number = 12_345_678;
    for i in 0..4u8 {
        let mut validator = Validator {
            effective_balance: 32_000_000_000,
            activation_epoch: 10 + u64::from(i),
            ..Validator::default()
        };
        validator.withdrawal_credentials[0] = 0x01;
        validator.withdrawal_credentials[31] = i;
        state.validators.push(validator).expect("within limit");
        state.balances.push(32_000_000_000).expect("within limit");
    }
    for i in 0..2u64 {
        state
            .pending_consolidations
            .push(PendingConsolidation { source_index: i, target_index: i + 10 })
            .expect("within limit");
    }
    state
}

fn query_api_over(state: BeaconState) -> QueryApi {
    let snapshot = Snapshot::linked(state, Version([4, 0, 0, 0]));
    let store = Arc::new(FixtureBeaconStore::single(snapshot));
    QueryApi::new(store)
}

#[test]
fn top_level_field_proof_verifies_against_state_root() {
    let state = populated_state();
    let expected_root = state.hash_tree_root();
    let api = query_api_over(state);

    let proof = api.prove_state_field(BlockId::Head, "slot").unwrap();
    assert!(proof.is_valid());
    assert_eq!(proof.root, expected_root);
}

#[test]
fn validator_field_proof_survives_composition_into_the_state_root() {
    let state = populated_state();
    let expected_root = state.hash_tree_root();
    let api = query_api_over(state);

    let proof = api
        .prove_validator_field(BlockId::Head, 2, ValidatorField::ActivationEpoch)
        .unwrap();
    assert!(proof.is_valid());
    assert_eq!(proof.root, expected_root);
}

#[test]
fn pending_consolidation_field_proof_is_valid() {
    let state = populated_state();
    let api = query_api_over(state);

    let proof = api
        .prove_pending_consolidation_field(BlockId::Head, 1, PendingConsolidationField::TargetIndex)
        .unwrap();
    assert!(proof.is_valid());
}

#[test]
fn execution_fee_recipient_and_block_number_proofs_carry_distinct_gindices() {
    let state = populated_state();
    let api = query_api_over(state);

    let fee_recipient_proof = api.prove_execution_fee_recipient(BlockId::Head).unwrap();
    let block_number_proof = api.prove_execution_block_number(BlockId::Head).unwrap();
    assert!(fee_recipient_proof.is_valid());
    assert!(block_number_proof.is_valid());
    assert_ne!(fee_recipient_proof.gindex, block_number_proof.gindex);
}

#[test]
fn field_in_block_composition_rescopes_the_proof_root_to_the_block_header() {
    let state = populated_state();
    let api = query_api_over(state.clone());

    let state_proof = api.prove_state_field(BlockId::Head, "validators").unwrap();
    let block_proof = api.prove_field_in_block(BlockId::Head, state_proof.clone()).unwrap();

    assert!(block_proof.is_valid());
    assert_ne!(block_proof.root, state_proof.root);
    assert!(block_proof.branch.len() > state_proof.branch.len());
}

#[test]
fn execution_fee_recipient_in_block_returns_the_same_value_stored_in_state() {
    let state = populated_state();
    let expected = state.latest_execution_payload_header.fee_recipient;
    let api = query_api_over(state);

    let (proof, fee_recipient) = api.prove_execution_fee_recipient_in_block(BlockId::Head).unwrap();
    assert!(proof.is_valid());
    assert_eq!(fee_recipient.0, expected);
}

#[test]
fn execution_block_number_in_block_returns_the_same_value_stored_in_state() {
    let state = populated_state();
    let api = query_api_over(state);

    let (proof, block_number) = api.prove_execution_block_number_in_block(BlockId::Head).unwrap();
    assert!(proof.is_valid());
    assert_eq!(block_number, 12_345_678);
}

#[test]
fn slot_with_no_snapshot_surfaces_as_state_unavailable() {
    let api = query_api_over(populated_state());
    let err = api.prove_state_field(BlockId::Slot(999), "slot").unwrap_err();
    assert!(matches!(err, CoreError::StateUnavailable { slot: 999 }));
}

#[test]
fn out_of_range_validator_index_surfaces_as_field_path_not_found() {
    let api = query_api_over(populated_state());
    let err = api
        .prove_validator_field(BlockId::Head, 99, ValidatorField::Pubkey)
        .unwrap_err();
    assert!(matches!(err, CoreError::FieldPathNotFound { .. }));
}

#[test]
fn top_level_field_index_is_stable_across_the_declared_field_count() {
    // every declared field index must resolve to a valid, self-checking proof
    let state = populated_state();
    let api = query_api_over(state);
    for idx in 0..field_index::FIELD_COUNT {
        let path = match idx {
            i if i == field_index::SLOT => "slot",
            i if i == field_index::VALIDATORS => "validators",
            i if i == field_index::LATEST_EXECUTION_PAYLOAD_HEADER => "latest_execution_payload_header",
            _ => continue,
        };
        assert!(api.prove_state_field(BlockId::Head, path).unwrap().is_valid());
    }
}

mod proptest_roundtrip {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn validator_field_proofs_verify_for_any_populated_index(count in 1usize..16, pick in 0usize..16) {
            let index = pick % count;
            let mut state = BeaconState { slot: 1, ..BeaconState::default() };
            for i in 0..count {
                let mut validator = Validator::default();
                validator.effective_balance = 32_000_000_000;
                validator.activation_epoch = i as u64;
                state.validators.push(validator).unwrap();
            }
            let api = query_api_over(state);
            let proof = api
                .prove_validator_field(BlockId::Head, index, ValidatorField::EffectiveBalance)
                .unwrap();
            prop_assert!(proof.is_valid());
        }
    }
}
