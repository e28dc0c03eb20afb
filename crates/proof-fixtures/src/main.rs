//! Generates JSON proof fixtures against a synthetic beacon state: one file
//! covering top-level state fields, validator fields, pending-consolidation
//! fields, and a field re-rooted at the enclosing block. Downstream
//! verifiers (e.g. Solidity test suites) can replay these without standing
//! up a beacon node.

use anyhow::Result;
use beacon_store::fixture_store::Snapshot;
use clap::Parser;
use serde::Serialize;
use ssz_merkle_core::primitives::Version;
use ssz_merkle_core::proof::{Proof, ProofComposer};
use ssz_merkle_core::registry::{ExecutionPayloadHeaderField, PendingConsolidationField, ValidatorField};
use ssz_merkle_core::schema::{BeaconState, PendingConsolidation, Validator};
use ssz_merkle_core::ssz::Merkleize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "generate-proof-fixtures")]
#[command(about = "Generate Merkle proof fixtures against a synthetic beacon state")]
struct Args {
    /// Output file path
    #[arg(short, long, default_value = "fixtures/proof_fixtures.json")]
    output: PathBuf,

    /// Number of validators to populate
    #[arg(long, default_value_t = 8)]
    num_validators: usize,

    /// Number of pending consolidations to populate
    #[arg(long, default_value_t = 3)]
    num_consolidations: usize,
}

#[derive(Debug, Serialize)]
struct NamedProof {
    description: String,
    proof: Proof,
}

#[derive(Debug, Serialize)]
struct FixtureFile {
    fork_version: String,
    state_root: String,
    block_root: String,
    state_field_proofs: Vec<NamedProof>,
    validator_field_proofs: Vec<NamedProof>,
    pending_consolidation_field_proofs: Vec<NamedProof>,
    execution_payload_header_field_proofs: Vec<NamedProof>,
    field_in_block_proofs: Vec<NamedProof>,
}

fn synthetic_validator(index: u8) -> Validator {
    let mut v = Validator { effective_balance: 32_000_000_000, activation_epoch: 100 + u64::from(index), ..Validator::default() };
    v.withdrawal_credentials[0] = 0x01;
    v.withdrawal_credentials[31] = index;
    v
}

fn build_state(num_validators: usize, num_consolidations: usize) -> BeaconState {
    let mut state = BeaconState { slot: 1_234_567, ..BeaconState::default() };
    state.latest_execution_payload_header.fee_recipient = [0xabu8; 20];
    state.latest_execution_payload_header.block_number = 19_000_000;
    for i in 0..num_validators {
        state.validators.push(synthetic_validator(i as u8)).expect("within VALIDATOR_REGISTRY_LIMIT");
        state.balances.push(32_000_000_000).expect("within VALIDATOR_REGISTRY_LIMIT");
    }
    for i in 0..num_consolidations {
        state
            .pending_consolidations
            .push(PendingConsolidation { source_index: i as u64, target_index: (i as u64) + 100 })
            .expect("within PENDING_CONSOLIDATIONS_LIMIT");
    }
    state
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::info!(
        validators = args.num_validators,
        consolidations = args.num_consolidations,
        "generating proof fixtures"
    );

    let fork = Version([4, 0, 0, 0]);
    let state = build_state(args.num_validators, args.num_consolidations);
    let snapshot = Snapshot::linked(state.clone(), fork);

    let mut state_field_proofs = Vec::new();
    let slot_proof = ProofComposer::prove_field_in_state(&state, ssz_merkle_core::schema::field_index::SLOT, fork)?;
    state_field_proofs.push(NamedProof { description: "state.slot".to_string(), proof: slot_proof.clone() });

    let mut validator_field_proofs = Vec::new();
    for i in 0..args.num_validators {
        for (name, field) in
            [("withdrawal_credentials", ValidatorField::WithdrawalCredentials), ("activation_epoch", ValidatorField::ActivationEpoch)]
        {
            let proof = ProofComposer::prove_validator_field_in_state(&state, i, field, fork)?;
            validator_field_proofs
                .push(NamedProof { description: format!("state.validators[{i}].{name}"), proof });
        }
    }

    let mut pending_consolidation_field_proofs = Vec::new();
    for i in 0..args.num_consolidations {
        let proof =
            ProofComposer::prove_pending_consolidation_field_in_state(&state, i, PendingConsolidationField::SourceIndex, fork)?;
        pending_consolidation_field_proofs
            .push(NamedProof { description: format!("state.pending_consolidations[{i}].source_index"), proof });
    }

    let mut execution_payload_header_field_proofs = Vec::new();
    for (name, field) in [
        ("fee_recipient", ExecutionPayloadHeaderField::FeeRecipient),
        ("block_number", ExecutionPayloadHeaderField::BlockNumber),
    ] {
        let proof = ProofComposer::prove_execution_payload_header_field_in_state(&state, field, fork)?;
        execution_payload_header_field_proofs
            .push(NamedProof { description: format!("state.latest_execution_payload_header.{name}"), proof });
    }

    let state_in_block = ProofComposer::prove_state_in_block(&state, &snapshot.header, fork)?;
    let field_in_block = ProofComposer::prove_field_in_block(slot_proof, state_in_block, fork)?;
    let field_in_block_proofs =
        vec![NamedProof { description: "state.slot re-rooted at block".to_string(), proof: field_in_block }];

    let fixture = FixtureFile {
        fork_version: fork.to_string(),
        state_root: state.hash_tree_root().to_string(),
        block_root: snapshot.header.hash_tree_root().to_string(),
        state_field_proofs,
        validator_field_proofs,
        pending_consolidation_field_proofs,
        execution_payload_header_field_proofs,
        field_in_block_proofs,
    };

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&fixture)?;
    std::fs::write(&args.output, json)?;
    tracing::info!(path = %args.output.display(), "wrote proof fixtures");

    Ok(())
}
