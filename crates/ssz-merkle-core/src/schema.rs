//! The beacon state and block containers this crate knows how to
//! Merkleize and prove against (`spec.md §3`).
//!
//! One preset is carried here — mainnet-scale limits — rather than the
//! teacher's compile-time `gnosis`/`minimal` feature split. The sparse
//! Merkleizer never materializes a full tree, so a 2^40-leaf validator
//! registry costs the same to address as a 2^10 one; the only reason the
//! teacher kept a small preset was to let a derive macro allocate a real
//! `Vec` of that length for its test fixtures; this crate's `List`/`Vector`
//! wrappers hold whatever a caller actually populates, independent of `N`.

use crate::error::CoreError;
use crate::merkleizer;
use crate::primitives::Root;
use crate::ssz::container::{encode_variable_container, split_variable_container, FieldBytes, FieldSlot, Merkleize};
use crate::ssz::{ssz_fixed_container, List, SimpleSerialize, Vector};

pub mod limits {
    pub const SLOTS_PER_HISTORICAL_ROOT: usize = 8_192;
    pub const HISTORICAL_ROOTS_LIMIT: usize = 1 << 24;
    pub const ETH1_DATA_VOTES_LIMIT: usize = 2_048;
    pub const VALIDATOR_REGISTRY_LIMIT: usize = 1 << 40;
    pub const EPOCHS_PER_SLASHINGS_VECTOR: usize = 8_192;
    pub const SYNC_COMMITTEE_SIZE: usize = 512;
    pub const HISTORICAL_SUMMARIES_LIMIT: usize = 1 << 24;
    pub const PENDING_DEPOSITS_LIMIT: usize = 1 << 27;
    pub const PENDING_PARTIAL_WITHDRAWALS_LIMIT: usize = 1 << 27;
    pub const PENDING_CONSOLIDATIONS_LIMIT: usize = 1 << 18;
    pub const MAX_EXTRA_DATA_BYTES: usize = 32;
    pub const BYTES_PER_LOGS_BLOOM: usize = 256;
}

use limits::*;

/// A little-endian 256-bit unsigned integer, SSZ's `uint256` (used only for
/// `base_fee_per_gas`). Fixed-size like any other `uintN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Uint256(pub [u8; 32]);

impl SimpleSerialize for Uint256 {
    fn is_variable_size() -> bool {
        false
    }

    fn fixed_size() -> Option<usize> {
        Some(32)
    }

    fn serialized_size(&self) -> usize {
        32
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, CoreError> {
        <[u8; 32]>::deserialize(bytes).map(Uint256)
    }
}

impl Merkleize for Uint256 {
    fn hash_tree_root(&self) -> Root {
        Root(self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoint {
    pub epoch: u64,
    pub root: [u8; 32],
}
ssz_fixed_container!(Checkpoint { epoch: u64, root: [u8; 32] });

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eth1Data {
    pub deposit_root: [u8; 32],
    pub deposit_count: u64,
    pub block_hash: [u8; 32],
}
ssz_fixed_container!(Eth1Data { deposit_root: [u8; 32], deposit_count: u64, block_hash: [u8; 32] });

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fork {
    pub previous_version: [u8; 4],
    pub current_version: [u8; 4],
    pub epoch: u64,
}
ssz_fixed_container!(Fork { previous_version: [u8; 4], current_version: [u8; 4], epoch: u64 });

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeaconBlockHeader {
    pub slot: u64,
    pub proposer_index: u64,
    pub parent_root: [u8; 32],
    pub state_root: [u8; 32],
    pub body_root: [u8; 32],
}
ssz_fixed_container!(BeaconBlockHeader {
    slot: u64,
    proposer_index: u64,
    parent_root: [u8; 32],
    state_root: [u8; 32],
    body_root: [u8; 32],
});

impl BeaconBlockHeader {
    fn field_roots(&self) -> Vec<Root> {
        vec![
            self.slot.hash_tree_root(),
            self.proposer_index.hash_tree_root(),
            self.parent_root.hash_tree_root(),
            self.state_root.hash_tree_root(),
            self.body_root.hash_tree_root(),
        ]
    }

    /// Sibling proof for one of this header's 5 fields. Returns `(leaf, branch, root)`.
    #[must_use]
    pub fn prove_field(&self, field_index: usize) -> (Root, Vec<Root>, Root) {
        let roots = self.field_roots();
        let depth = merkleizer::ceil_log2(roots.len());
        let (branch, root) = merkleizer::prove_chunk(&roots, field_index, depth);
        (roots[field_index], branch, root)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    pub pubkey: Vector<u8, 48>,
    pub withdrawal_credentials: [u8; 32],
    pub effective_balance: u64,
    pub slashed: bool,
    pub activation_eligibility_epoch: u64,
    pub activation_epoch: u64,
    pub exit_epoch: u64,
    pub withdrawable_epoch: u64,
}
ssz_fixed_container!(Validator {
    pubkey: Vector<u8, 48>,
    withdrawal_credentials: [u8; 32],
    effective_balance: u64,
    slashed: bool,
    activation_eligibility_epoch: u64,
    activation_epoch: u64,
    exit_epoch: u64,
    withdrawable_epoch: u64,
});

impl Validator {
    fn field_roots(&self) -> Vec<Root> {
        vec![
            self.pubkey.hash_tree_root(),
            self.withdrawal_credentials.hash_tree_root(),
            self.effective_balance.hash_tree_root(),
            self.slashed.hash_tree_root(),
            self.activation_eligibility_epoch.hash_tree_root(),
            self.activation_epoch.hash_tree_root(),
            self.exit_epoch.hash_tree_root(),
            self.withdrawable_epoch.hash_tree_root(),
        ]
    }

    /// Sibling proof for one of this validator's 8 fields. Returns `(leaf, branch, root)`.
    #[must_use]
    pub fn prove_field(&self, field_index: usize) -> (Root, Vec<Root>, Root) {
        let roots = self.field_roots();
        let depth = merkleizer::ceil_log2(roots.len());
        let (branch, root) = merkleizer::prove_chunk(&roots, field_index, depth);
        (roots[field_index], branch, root)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            pubkey: Vector::default(),
            withdrawal_credentials: [0u8; 32],
            effective_balance: 0,
            slashed: false,
            activation_eligibility_epoch: 0,
            activation_epoch: 0,
            exit_epoch: 0,
            withdrawable_epoch: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingConsolidation {
    pub source_index: u64,
    pub target_index: u64,
}
ssz_fixed_container!(PendingConsolidation { source_index: u64, target_index: u64 });

impl PendingConsolidation {
    fn field_roots(&self) -> Vec<Root> {
        vec![self.source_index.hash_tree_root(), self.target_index.hash_tree_root()]
    }

    /// Sibling proof for one of this record's 2 fields. Returns `(leaf, branch, root)`.
    #[must_use]
    pub fn prove_field(&self, field_index: usize) -> (Root, Vec<Root>, Root) {
        let roots = self.field_roots();
        let depth = merkleizer::ceil_log2(roots.len());
        let (branch, root) = merkleizer::prove_chunk(&roots, field_index, depth);
        (roots[field_index], branch, root)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeposit {
    pub pubkey: Vector<u8, 48>,
    pub withdrawal_credentials: [u8; 32],
    pub amount: u64,
    pub signature: Vector<u8, 96>,
    pub slot: u64,
}
ssz_fixed_container!(PendingDeposit {
    pubkey: Vector<u8, 48>,
    withdrawal_credentials: [u8; 32],
    amount: u64,
    signature: Vector<u8, 96>,
    slot: u64,
});

impl Default for PendingDeposit {
    fn default() -> Self {
        Self {
            pubkey: Vector::default(),
            withdrawal_credentials: [0u8; 32],
            amount: 0,
            signature: Vector::default(),
            slot: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingPartialWithdrawal {
    pub index: u64,
    pub amount: u64,
    pub withdrawable_epoch: u64,
}
ssz_fixed_container!(PendingPartialWithdrawal { index: u64, amount: u64, withdrawable_epoch: u64 });

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoricalSummary {
    pub block_summary_root: [u8; 32],
    pub state_summary_root: [u8; 32],
}
ssz_fixed_container!(HistoricalSummary { block_summary_root: [u8; 32], state_summary_root: [u8; 32] });

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCommittee {
    pub pubkeys: Vector<Vector<u8, 48>, SYNC_COMMITTEE_SIZE>,
    pub aggregate_pubkey: Vector<u8, 48>,
}
ssz_fixed_container!(SyncCommittee {
    pubkeys: Vector<Vector<u8, 48>, SYNC_COMMITTEE_SIZE>,
    aggregate_pubkey: Vector<u8, 48>,
});

impl Default for SyncCommittee {
    fn default() -> Self {
        Self { pubkeys: Vector::default(), aggregate_pubkey: Vector::default() }
    }
}

/// The execution payload header embedded in the beacon state. Variable-size
/// because of `extra_data`; hand-written rather than macro-generated, same
/// as the teacher treats its one variable-size container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPayloadHeader {
    pub parent_hash: [u8; 32],
    pub fee_recipient: [u8; 20],
    pub state_root: [u8; 32],
    pub receipts_root: [u8; 32],
    pub logs_bloom: Vector<u8, BYTES_PER_LOGS_BLOOM>,
    pub prev_randao: [u8; 32],
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: List<u8, MAX_EXTRA_DATA_BYTES>,
    pub base_fee_per_gas: Uint256,
    pub block_hash: [u8; 32],
    pub transactions_root: [u8; 32],
    pub withdrawals_root: [u8; 32],
    pub blob_gas_used: u64,
    pub excess_blob_gas: u64,
}

impl Default for ExecutionPayloadHeader {
    fn default() -> Self {
        Self {
            parent_hash: [0u8; 32],
            fee_recipient: [0u8; 20],
            state_root: [0u8; 32],
            receipts_root: [0u8; 32],
            logs_bloom: Vector::default(),
            prev_randao: [0u8; 32],
            block_number: 0,
            gas_limit: 0,
            gas_used: 0,
            timestamp: 0,
            extra_data: List::default(),
            base_fee_per_gas: Uint256::default(),
            block_hash: [0u8; 32],
            transactions_root: [0u8; 32],
            withdrawals_root: [0u8; 32],
            blob_gas_used: 0,
            excess_blob_gas: 0,
        }
    }
}

const EXECUTION_PAYLOAD_HEADER_FIXED_SIZES: [Option<usize>; 17] = [
    Some(32),
    Some(20),
    Some(32),
    Some(32),
    Some(BYTES_PER_LOGS_BLOOM),
    Some(32),
    Some(8),
    Some(8),
    Some(8),
    Some(8),
    None, // extra_data
    Some(32),
    Some(32),
    Some(32),
    Some(32),
    Some(8),
    Some(8),
];

impl SimpleSerialize for ExecutionPayloadHeader {
    fn is_variable_size() -> bool {
        true
    }

    fn fixed_size() -> Option<usize> {
        None
    }

    fn serialized_size(&self) -> usize {
        self.to_ssz_bytes().len()
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        let fields = vec![
            FieldBytes::Fixed(self.parent_hash.to_ssz_bytes()),
            FieldBytes::Fixed(self.fee_recipient.to_ssz_bytes()),
            FieldBytes::Fixed(self.state_root.to_ssz_bytes()),
            FieldBytes::Fixed(self.receipts_root.to_ssz_bytes()),
            FieldBytes::Fixed(self.logs_bloom.to_ssz_bytes()),
            FieldBytes::Fixed(self.prev_randao.to_ssz_bytes()),
            FieldBytes::Fixed(self.block_number.to_ssz_bytes()),
            FieldBytes::Fixed(self.gas_limit.to_ssz_bytes()),
            FieldBytes::Fixed(self.gas_used.to_ssz_bytes()),
            FieldBytes::Fixed(self.timestamp.to_ssz_bytes()),
            FieldBytes::Variable(self.extra_data.to_ssz_bytes()),
            FieldBytes::Fixed(self.base_fee_per_gas.to_ssz_bytes()),
            FieldBytes::Fixed(self.block_hash.to_ssz_bytes()),
            FieldBytes::Fixed(self.transactions_root.to_ssz_bytes()),
            FieldBytes::Fixed(self.withdrawals_root.to_ssz_bytes()),
            FieldBytes::Fixed(self.blob_gas_used.to_ssz_bytes()),
            FieldBytes::Fixed(self.excess_blob_gas.to_ssz_bytes()),
        ];
        out.extend_from_slice(&encode_variable_container(&fields));
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, CoreError> {
        let slots = split_variable_container(bytes, &EXECUTION_PAYLOAD_HEADER_FIXED_SIZES)?;
        let fixed = |slot: &FieldSlot<'_>| match slot {
            FieldSlot::Fixed(b) => *b,
            FieldSlot::Variable(_) => unreachable!("fixed field resolved as variable"),
        };
        let variable = |slot: &FieldSlot<'_>| match slot {
            FieldSlot::Variable(b) => *b,
            FieldSlot::Fixed(_) => unreachable!("variable field resolved as fixed"),
        };
        Ok(Self {
            parent_hash: SimpleSerialize::deserialize(fixed(&slots[0]))?,
            fee_recipient: SimpleSerialize::deserialize(fixed(&slots[1]))?,
            state_root: SimpleSerialize::deserialize(fixed(&slots[2]))?,
            receipts_root: SimpleSerialize::deserialize(fixed(&slots[3]))?,
            logs_bloom: SimpleSerialize::deserialize(fixed(&slots[4]))?,
            prev_randao: SimpleSerialize::deserialize(fixed(&slots[5]))?,
            block_number: SimpleSerialize::deserialize(fixed(&slots[6]))?,
            gas_limit: SimpleSerialize::deserialize(fixed(&slots[7]))?,
            gas_used: SimpleSerialize::deserialize(fixed(&slots[8]))?,
            timestamp: SimpleSerialize::deserialize(fixed(&slots[9]))?,
            extra_data: SimpleSerialize::deserialize(variable(&slots[10]))?,
            base_fee_per_gas: SimpleSerialize::deserialize(fixed(&slots[11]))?,
            block_hash: SimpleSerialize::deserialize(fixed(&slots[12]))?,
            transactions_root: SimpleSerialize::deserialize(fixed(&slots[13]))?,
            withdrawals_root: SimpleSerialize::deserialize(fixed(&slots[14]))?,
            blob_gas_used: SimpleSerialize::deserialize(fixed(&slots[15]))?,
            excess_blob_gas: SimpleSerialize::deserialize(fixed(&slots[16]))?,
        })
    }
}

impl ExecutionPayloadHeader {
    fn field_roots(&self) -> Vec<Root> {
        vec![
            self.parent_hash.hash_tree_root(),
            self.fee_recipient.hash_tree_root(),
            self.state_root.hash_tree_root(),
            self.receipts_root.hash_tree_root(),
            self.logs_bloom.hash_tree_root(),
            self.prev_randao.hash_tree_root(),
            self.block_number.hash_tree_root(),
            self.gas_limit.hash_tree_root(),
            self.gas_used.hash_tree_root(),
            self.timestamp.hash_tree_root(),
            self.extra_data.hash_tree_root(),
            self.base_fee_per_gas.hash_tree_root(),
            self.block_hash.hash_tree_root(),
            self.transactions_root.hash_tree_root(),
            self.withdrawals_root.hash_tree_root(),
            self.blob_gas_used.hash_tree_root(),
            self.excess_blob_gas.hash_tree_root(),
        ]
    }

    /// Sibling proof for one of this header's 17 fields. Returns `(leaf, branch, root)`.
    #[must_use]
    pub fn prove_field(&self, field_index: usize) -> (Root, Vec<Root>, Root) {
        let roots = self.field_roots();
        let depth = merkleizer::ceil_log2(roots.len());
        let (branch, root) = merkleizer::prove_chunk(&roots, field_index, depth);
        (roots[field_index], branch, root)
    }
}

impl Merkleize for ExecutionPayloadHeader {
    fn hash_tree_root(&self) -> Root {
        merkleizer::merkleize_field_roots(&self.field_roots())
    }
}

/// The 37-field Electra-shaped beacon state (`spec.md §3`, "BeaconState").
/// Variable-size: most of its fields are `List`s, plus the nested
/// `ExecutionPayloadHeader`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconState {
    pub genesis_time: u64,
    pub genesis_validators_root: [u8; 32],
    pub slot: u64,
    pub fork: Fork,
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: Vector<[u8; 32], SLOTS_PER_HISTORICAL_ROOT>,
    pub state_roots: Vector<[u8; 32], SLOTS_PER_HISTORICAL_ROOT>,
    pub historical_roots: List<[u8; 32], HISTORICAL_ROOTS_LIMIT>,
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: List<Eth1Data, ETH1_DATA_VOTES_LIMIT>,
    pub eth1_deposit_index: u64,
    pub validators: List<Validator, VALIDATOR_REGISTRY_LIMIT>,
    pub balances: List<u64, VALIDATOR_REGISTRY_LIMIT>,
    pub randao_mixes: Vector<[u8; 32], EPOCHS_PER_SLASHINGS_VECTOR>,
    pub slashings: Vector<u64, EPOCHS_PER_SLASHINGS_VECTOR>,
    pub previous_epoch_participation: List<u8, VALIDATOR_REGISTRY_LIMIT>,
    pub current_epoch_participation: List<u8, VALIDATOR_REGISTRY_LIMIT>,
    pub justification_bits: [u8; 1],
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
    pub inactivity_scores: List<u64, VALIDATOR_REGISTRY_LIMIT>,
    pub current_sync_committee: SyncCommittee,
    pub next_sync_committee: SyncCommittee,
    pub latest_execution_payload_header: ExecutionPayloadHeader,
    pub next_withdrawal_index: u64,
    pub next_withdrawal_validator_index: u64,
    pub historical_summaries: List<HistoricalSummary, HISTORICAL_SUMMARIES_LIMIT>,
    pub deposit_requests_start_index: u64,
    pub deposit_balance_to_consume: u64,
    pub exit_balance_to_consume: u64,
    pub earliest_exit_epoch: u64,
    pub consolidation_balance_to_consume: u64,
    pub earliest_consolidation_epoch: u64,
    pub pending_deposits: List<PendingDeposit, PENDING_DEPOSITS_LIMIT>,
    pub pending_partial_withdrawals: List<PendingPartialWithdrawal, PENDING_PARTIAL_WITHDRAWALS_LIMIT>,
    pub pending_consolidations: List<PendingConsolidation, PENDING_CONSOLIDATIONS_LIMIT>,
}

impl Default for BeaconState {
    fn default() -> Self {
        Self {
            genesis_time: 0,
            genesis_validators_root: [0u8; 32],
            slot: 0,
            fork: Fork::default(),
            latest_block_header: BeaconBlockHeader::default(),
            block_roots: Vector::default(),
            state_roots: Vector::default(),
            historical_roots: List::default(),
            eth1_data: Eth1Data::default(),
            eth1_data_votes: List::default(),
            eth1_deposit_index: 0,
            validators: List::default(),
            balances: List::default(),
            randao_mixes: Vector::default(),
            slashings: Vector::default(),
            previous_epoch_participation: List::default(),
            current_epoch_participation: List::default(),
            justification_bits: [0u8; 1],
            previous_justified_checkpoint: Checkpoint::default(),
            current_justified_checkpoint: Checkpoint::default(),
            finalized_checkpoint: Checkpoint::default(),
            inactivity_scores: List::default(),
            current_sync_committee: SyncCommittee::default(),
            next_sync_committee: SyncCommittee::default(),
            latest_execution_payload_header: ExecutionPayloadHeader::default(),
            next_withdrawal_index: 0,
            next_withdrawal_validator_index: 0,
            historical_summaries: List::default(),
            deposit_requests_start_index: 0,
            deposit_balance_to_consume: 0,
            exit_balance_to_consume: 0,
            earliest_exit_epoch: 0,
            consolidation_balance_to_consume: 0,
            earliest_consolidation_epoch: 0,
            pending_deposits: List::default(),
            pending_partial_withdrawals: List::default(),
            pending_consolidations: List::default(),
        }
    }
}

/// Field index of each top-level `BeaconState` member, in declaration order.
/// The gindex registry (`crate::registry`) is built from these.
pub mod field_index {
    pub const GENESIS_TIME: usize = 0;
    pub const GENESIS_VALIDATORS_ROOT: usize = 1;
    pub const SLOT: usize = 2;
    pub const FORK: usize = 3;
    pub const LATEST_BLOCK_HEADER: usize = 4;
    pub const BLOCK_ROOTS: usize = 5;
    pub const STATE_ROOTS: usize = 6;
    pub const HISTORICAL_ROOTS: usize = 7;
    pub const ETH1_DATA: usize = 8;
    pub const ETH1_DATA_VOTES: usize = 9;
    pub const ETH1_DEPOSIT_INDEX: usize = 10;
    pub const VALIDATORS: usize = 11;
    pub const BALANCES: usize = 12;
    pub const RANDAO_MIXES: usize = 13;
    pub const SLASHINGS: usize = 14;
    pub const PREVIOUS_EPOCH_PARTICIPATION: usize = 15;
    pub const CURRENT_EPOCH_PARTICIPATION: usize = 16;
    pub const JUSTIFICATION_BITS: usize = 17;
    pub const PREVIOUS_JUSTIFIED_CHECKPOINT: usize = 18;
    pub const CURRENT_JUSTIFIED_CHECKPOINT: usize = 19;
    pub const FINALIZED_CHECKPOINT: usize = 20;
    pub const INACTIVITY_SCORES: usize = 21;
    pub const CURRENT_SYNC_COMMITTEE: usize = 22;
    pub const NEXT_SYNC_COMMITTEE: usize = 23;
    pub const LATEST_EXECUTION_PAYLOAD_HEADER: usize = 24;
    pub const NEXT_WITHDRAWAL_INDEX: usize = 25;
    pub const NEXT_WITHDRAWAL_VALIDATOR_INDEX: usize = 26;
    pub const HISTORICAL_SUMMARIES: usize = 27;
    pub const DEPOSIT_REQUESTS_START_INDEX: usize = 28;
    pub const DEPOSIT_BALANCE_TO_CONSUME: usize = 29;
    pub const EXIT_BALANCE_TO_CONSUME: usize = 30;
    pub const EARLIEST_EXIT_EPOCH: usize = 31;
    pub const CONSOLIDATION_BALANCE_TO_CONSUME: usize = 32;
    pub const EARLIEST_CONSOLIDATION_EPOCH: usize = 33;
    pub const PENDING_DEPOSITS: usize = 34;
    pub const PENDING_PARTIAL_WITHDRAWALS: usize = 35;
    pub const PENDING_CONSOLIDATIONS: usize = 36;
    pub const FIELD_COUNT: usize = 37;
}

const BEACON_STATE_FIXED_SIZES: [Option<usize>; field_index::FIELD_COUNT] = {
    use field_index::*;
    let mut sizes = [None; FIELD_COUNT];
    sizes[GENESIS_TIME] = Some(8);
    sizes[GENESIS_VALIDATORS_ROOT] = Some(32);
    sizes[SLOT] = Some(8);
    sizes[FORK] = Some(4 + 4 + 8);
    sizes[LATEST_BLOCK_HEADER] = Some(8 + 8 + 32 + 32 + 32);
    sizes[BLOCK_ROOTS] = Some(32 * SLOTS_PER_HISTORICAL_ROOT);
    sizes[STATE_ROOTS] = Some(32 * SLOTS_PER_HISTORICAL_ROOT);
    sizes[HISTORICAL_ROOTS] = None;
    sizes[ETH1_DATA] = Some(32 + 8 + 32);
    sizes[ETH1_DATA_VOTES] = None;
    sizes[ETH1_DEPOSIT_INDEX] = Some(8);
    sizes[VALIDATORS] = None;
    sizes[BALANCES] = None;
    sizes[RANDAO_MIXES] = Some(32 * EPOCHS_PER_SLASHINGS_VECTOR);
    sizes[SLASHINGS] = Some(8 * EPOCHS_PER_SLASHINGS_VECTOR);
    sizes[PREVIOUS_EPOCH_PARTICIPATION] = None;
    sizes[CURRENT_EPOCH_PARTICIPATION] = None;
    sizes[JUSTIFICATION_BITS] = Some(1);
    sizes[PREVIOUS_JUSTIFIED_CHECKPOINT] = Some(8 + 32);
    sizes[CURRENT_JUSTIFIED_CHECKPOINT] = Some(8 + 32);
    sizes[FINALIZED_CHECKPOINT] = Some(8 + 32);
    sizes[INACTIVITY_SCORES] = None;
    sizes[CURRENT_SYNC_COMMITTEE] = Some(48 * SYNC_COMMITTEE_SIZE + 48);
    sizes[NEXT_SYNC_COMMITTEE] = Some(48 * SYNC_COMMITTEE_SIZE + 48);
    sizes[LATEST_EXECUTION_PAYLOAD_HEADER] = None;
    sizes[NEXT_WITHDRAWAL_INDEX] = Some(8);
    sizes[NEXT_WITHDRAWAL_VALIDATOR_INDEX] = Some(8);
    sizes[HISTORICAL_SUMMARIES] = None;
    sizes[DEPOSIT_REQUESTS_START_INDEX] = Some(8);
    sizes[DEPOSIT_BALANCE_TO_CONSUME] = Some(8);
    sizes[EXIT_BALANCE_TO_CONSUME] = Some(8);
    sizes[EARLIEST_EXIT_EPOCH] = Some(8);
    sizes[CONSOLIDATION_BALANCE_TO_CONSUME] = Some(8);
    sizes[EARLIEST_CONSOLIDATION_EPOCH] = Some(8);
    sizes[PENDING_DEPOSITS] = None;
    sizes[PENDING_PARTIAL_WITHDRAWALS] = None;
    sizes[PENDING_CONSOLIDATIONS] = None;
    sizes
};

impl SimpleSerialize for BeaconState {
    fn is_variable_size() -> bool {
        true
    }

    fn fixed_size() -> Option<usize> {
        None
    }

    fn serialized_size(&self) -> usize {
        self.to_ssz_bytes().len()
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        let fields = vec![
            FieldBytes::Fixed(self.genesis_time.to_ssz_bytes()),
            FieldBytes::Fixed(self.genesis_validators_root.to_ssz_bytes()),
            FieldBytes::Fixed(self.slot.to_ssz_bytes()),
            FieldBytes::Fixed(self.fork.to_ssz_bytes()),
            FieldBytes::Fixed(self.latest_block_header.to_ssz_bytes()),
            FieldBytes::Fixed(self.block_roots.to_ssz_bytes()),
            FieldBytes::Fixed(self.state_roots.to_ssz_bytes()),
            FieldBytes::Variable(self.historical_roots.to_ssz_bytes()),
            FieldBytes::Fixed(self.eth1_data.to_ssz_bytes()),
            FieldBytes::Variable(self.eth1_data_votes.to_ssz_bytes()),
            FieldBytes::Fixed(self.eth1_deposit_index.to_ssz_bytes()),
            FieldBytes::Variable(self.validators.to_ssz_bytes()),
            FieldBytes::Variable(self.balances.to_ssz_bytes()),
            FieldBytes::Fixed(self.randao_mixes.to_ssz_bytes()),
            FieldBytes::Fixed(self.slashings.to_ssz_bytes()),
            FieldBytes::Variable(self.previous_epoch_participation.to_ssz_bytes()),
            FieldBytes::Variable(self.current_epoch_participation.to_ssz_bytes()),
            FieldBytes::Fixed(self.justification_bits.to_ssz_bytes()),
            FieldBytes::Fixed(self.previous_justified_checkpoint.to_ssz_bytes()),
            FieldBytes::Fixed(self.current_justified_checkpoint.to_ssz_bytes()),
            FieldBytes::Fixed(self.finalized_checkpoint.to_ssz_bytes()),
            FieldBytes::Variable(self.inactivity_scores.to_ssz_bytes()),
            FieldBytes::Fixed(self.current_sync_committee.to_ssz_bytes()),
            FieldBytes::Fixed(self.next_sync_committee.to_ssz_bytes()),
            FieldBytes::Variable(self.latest_execution_payload_header.to_ssz_bytes()),
            FieldBytes::Fixed(self.next_withdrawal_index.to_ssz_bytes()),
            FieldBytes::Fixed(self.next_withdrawal_validator_index.to_ssz_bytes()),
            FieldBytes::Variable(self.historical_summaries.to_ssz_bytes()),
            FieldBytes::Fixed(self.deposit_requests_start_index.to_ssz_bytes()),
            FieldBytes::Fixed(self.deposit_balance_to_consume.to_ssz_bytes()),
            FieldBytes::Fixed(self.exit_balance_to_consume.to_ssz_bytes()),
            FieldBytes::Fixed(self.earliest_exit_epoch.to_ssz_bytes()),
            FieldBytes::Fixed(self.consolidation_balance_to_consume.to_ssz_bytes()),
            FieldBytes::Fixed(self.earliest_consolidation_epoch.to_ssz_bytes()),
            FieldBytes::Variable(self.pending_deposits.to_ssz_bytes()),
            FieldBytes::Variable(self.pending_partial_withdrawals.to_ssz_bytes()),
            FieldBytes::Variable(self.pending_consolidations.to_ssz_bytes()),
        ];
        out.extend_from_slice(&encode_variable_container(&fields));
    }

    fn deserialize(bytes: &[u8]) -> Result<Self, CoreError> {
        let slots = split_variable_container(bytes, &BEACON_STATE_FIXED_SIZES)?;
        fn fixed<'a>(slot: &FieldSlot<'a>) -> &'a [u8] {
            match slot {
                FieldSlot::Fixed(b) => b,
                FieldSlot::Variable(_) => unreachable!("fixed field resolved as variable"),
            }
        }
        fn variable<'a>(slot: &FieldSlot<'a>) -> &'a [u8] {
            match slot {
                FieldSlot::Variable(b) => b,
                FieldSlot::Fixed(_) => unreachable!("variable field resolved as fixed"),
            }
        }
        use field_index::*;
        Ok(Self {
            genesis_time: SimpleSerialize::deserialize(fixed(&slots[GENESIS_TIME]))?,
            genesis_validators_root: SimpleSerialize::deserialize(fixed(&slots[GENESIS_VALIDATORS_ROOT]))?,
            slot: SimpleSerialize::deserialize(fixed(&slots[SLOT]))?,
            fork: SimpleSerialize::deserialize(fixed(&slots[FORK]))?,
            latest_block_header: SimpleSerialize::deserialize(fixed(&slots[LATEST_BLOCK_HEADER]))?,
            block_roots: SimpleSerialize::deserialize(fixed(&slots[BLOCK_ROOTS]))?,
            state_roots: SimpleSerialize::deserialize(fixed(&slots[STATE_ROOTS]))?,
            historical_roots: SimpleSerialize::deserialize(variable(&slots[HISTORICAL_ROOTS]))?,
            eth1_data: SimpleSerialize::deserialize(fixed(&slots[ETH1_DATA]))?,
            eth1_data_votes: SimpleSerialize::deserialize(variable(&slots[ETH1_DATA_VOTES]))?,
            eth1_deposit_index: SimpleSerialize::deserialize(fixed(&slots[ETH1_DEPOSIT_INDEX]))?,
            validators: SimpleSerialize::deserialize(variable(&slots[VALIDATORS]))?,
            balances: SimpleSerialize::deserialize(variable(&slots[BALANCES]))?,
            randao_mixes: SimpleSerialize::deserialize(fixed(&slots[RANDAO_MIXES]))?,
            slashings: SimpleSerialize::deserialize(fixed(&slots[SLASHINGS]))?,
            previous_epoch_participation: SimpleSerialize::deserialize(variable(&slots[PREVIOUS_EPOCH_PARTICIPATION]))?,
            current_epoch_participation: SimpleSerialize::deserialize(variable(&slots[CURRENT_EPOCH_PARTICIPATION]))?,
            justification_bits: SimpleSerialize::deserialize(fixed(&slots[JUSTIFICATION_BITS]))?,
            previous_justified_checkpoint: SimpleSerialize::deserialize(fixed(&slots[PREVIOUS_JUSTIFIED_CHECKPOINT]))?,
            current_justified_checkpoint: SimpleSerialize::deserialize(fixed(&slots[CURRENT_JUSTIFIED_CHECKPOINT]))?,
            finalized_checkpoint: SimpleSerialize::deserialize(fixed(&slots[FINALIZED_CHECKPOINT]))?,
            inactivity_scores: SimpleSerialize::deserialize(variable(&slots[INACTIVITY_SCORES]))?,
            current_sync_committee: SimpleSerialize::deserialize(fixed(&slots[CURRENT_SYNC_COMMITTEE]))?,
            next_sync_committee: SimpleSerialize::deserialize(fixed(&slots[NEXT_SYNC_COMMITTEE]))?,
            latest_execution_payload_header: SimpleSerialize::deserialize(variable(&slots[LATEST_EXECUTION_PAYLOAD_HEADER]))?,
            next_withdrawal_index: SimpleSerialize::deserialize(fixed(&slots[NEXT_WITHDRAWAL_INDEX]))?,
            next_withdrawal_validator_index: SimpleSerialize::deserialize(fixed(&slots[NEXT_WITHDRAWAL_VALIDATOR_INDEX]))?,
            historical_summaries: SimpleSerialize::deserialize(variable(&slots[HISTORICAL_SUMMARIES]))?,
            deposit_requests_start_index: SimpleSerialize::deserialize(fixed(&slots[DEPOSIT_REQUESTS_START_INDEX]))?,
            deposit_balance_to_consume: SimpleSerialize::deserialize(fixed(&slots[DEPOSIT_BALANCE_TO_CONSUME]))?,
            exit_balance_to_consume: SimpleSerialize::deserialize(fixed(&slots[EXIT_BALANCE_TO_CONSUME]))?,
            earliest_exit_epoch: SimpleSerialize::deserialize(fixed(&slots[EARLIEST_EXIT_EPOCH]))?,
            consolidation_balance_to_consume: SimpleSerialize::deserialize(fixed(&slots[CONSOLIDATION_BALANCE_TO_CONSUME]))?,
            earliest_consolidation_epoch: SimpleSerialize::deserialize(fixed(&slots[EARLIEST_CONSOLIDATION_EPOCH]))?,
            pending_deposits: SimpleSerialize::deserialize(variable(&slots[PENDING_DEPOSITS]))?,
            pending_partial_withdrawals: SimpleSerialize::deserialize(variable(&slots[PENDING_PARTIAL_WITHDRAWALS]))?,
            pending_consolidations: SimpleSerialize::deserialize(variable(&slots[PENDING_CONSOLIDATIONS]))?,
        })
    }
}

impl BeaconState {
    /// Field roots in declaration order, for Merkleization and per-field proofs.
    fn field_roots(&self) -> Vec<Root> {
        vec![
            self.genesis_time.hash_tree_root(),
            self.genesis_validators_root.hash_tree_root(),
            self.slot.hash_tree_root(),
            self.fork.hash_tree_root(),
            self.latest_block_header.hash_tree_root(),
            self.block_roots.hash_tree_root(),
            self.state_roots.hash_tree_root(),
            self.historical_roots.hash_tree_root(),
            self.eth1_data.hash_tree_root(),
            self.eth1_data_votes.hash_tree_root(),
            self.eth1_deposit_index.hash_tree_root(),
            self.validators.hash_tree_root(),
            self.balances.hash_tree_root(),
            self.randao_mixes.hash_tree_root(),
            self.slashings.hash_tree_root(),
            self.previous_epoch_participation.hash_tree_root(),
            self.current_epoch_participation.hash_tree_root(),
            self.justification_bits.hash_tree_root(),
            self.previous_justified_checkpoint.hash_tree_root(),
            self.current_justified_checkpoint.hash_tree_root(),
            self.finalized_checkpoint.hash_tree_root(),
            self.inactivity_scores.hash_tree_root(),
            self.current_sync_committee.hash_tree_root(),
            self.next_sync_committee.hash_tree_root(),
            self.latest_execution_payload_header.hash_tree_root(),
            self.next_withdrawal_index.hash_tree_root(),
            self.next_withdrawal_validator_index.hash_tree_root(),
            self.historical_summaries.hash_tree_root(),
            self.deposit_requests_start_index.hash_tree_root(),
            self.deposit_balance_to_consume.hash_tree_root(),
            self.exit_balance_to_consume.hash_tree_root(),
            self.earliest_exit_epoch.hash_tree_root(),
            self.consolidation_balance_to_consume.hash_tree_root(),
            self.earliest_consolidation_epoch.hash_tree_root(),
            self.pending_deposits.hash_tree_root(),
            self.pending_partial_withdrawals.hash_tree_root(),
            self.pending_consolidations.hash_tree_root(),
        ]
    }

    /// Field-level sibling proof for `field_index`, used by the proof
    /// composer before it descends into the field's own internal structure.
    /// Returns `(leaf, branch, root)`.
    #[must_use]
    pub fn prove_top_level_field(&self, field_index: usize) -> (Root, Vec<Root>, Root) {
        let roots = self.field_roots();
        let depth = merkleizer::ceil_log2(roots.len());
        let (branch, root) = merkleizer::prove_chunk(&roots, field_index, depth);
        (roots[field_index], branch, root)
    }

    /// The registry-facing accessors the proof composer needs to reach into
    /// `validators`/`pending_consolidations` without exposing the raw `List`.
    #[must_use]
    pub fn validators_slice(&self) -> &[Validator] {
        &self.validators
    }

    #[must_use]
    pub fn pending_consolidations_slice(&self) -> &[PendingConsolidation] {
        &self.pending_consolidations
    }
}

impl Merkleize for BeaconState {
    fn hash_tree_root(&self) -> Root {
        merkleizer::merkleize_field_roots(&self.field_roots())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_hash_tree_root_is_deterministic() {
        let mut v = Validator::default();
        v.effective_balance = 32_000_000_000;
        v.activation_epoch = 100;
        v.withdrawal_credentials[0] = 0x01;
        assert_eq!(v.hash_tree_root(), v.hash_tree_root());
    }

    #[test]
    fn validator_roundtrips_through_ssz() {
        let mut v = Validator::default();
        v.withdrawal_credentials[5] = 9;
        v.activation_epoch = 42;
        let bytes = v.to_ssz_bytes();
        let back = Validator::deserialize(&bytes).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn execution_payload_header_roundtrips_with_extra_data() {
        let mut header = ExecutionPayloadHeader::default();
        header.extra_data = List::try_from(vec![1, 2, 3]).unwrap();
        header.block_number = 19_000_000;
        let bytes = header.to_ssz_bytes();
        let back = ExecutionPayloadHeader::deserialize(&bytes).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn beacon_state_default_hash_tree_root_is_nonzero() {
        let state = BeaconState::default();
        assert_ne!(state.hash_tree_root(), Root::ZERO);
    }

    #[test]
    fn beacon_state_roundtrips_with_populated_validators() {
        let mut state = BeaconState::default();
        for i in 0..5u8 {
            let mut v = Validator::default();
            v.withdrawal_credentials[0] = 0x01;
            v.withdrawal_credentials[31] = i;
            v.activation_epoch = 100 + u64::from(i);
            state.validators.push(v).unwrap();
            state.balances.push(32_000_000_000).unwrap();
        }
        let bytes = state.to_ssz_bytes();
        let back = BeaconState::deserialize(&bytes).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn top_level_field_proof_verifies_against_state_root() {
        let state = BeaconState::default();
        let (leaf, branch, computed_root) = state.prove_top_level_field(field_index::SLOT);
        assert_eq!(computed_root, state.hash_tree_root());
        assert_eq!(leaf, state.slot.hash_tree_root());
        assert_eq!(merkleizer::apply_proof(leaf, field_index::SLOT, &branch), computed_root);
    }
}
