//! Governance actions.
//!
//! A ballot proposes exactly one [`Action`].  The generic voting engine is
//! shared across all four kinds; only the per-variant payload and the
//! apply-effect step in [`crate::engine`] differ per kind.

use {
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    solana_pubkey::Pubkey,
};

/// Which of a validator's three credentials a key change targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum KeyKind {
    Mining,
    Voting,
    Payout,
}

/// The kind of mutation a key change performs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum ChangeKind {
    Add,
    Remove,
    Swap,
}

/// What an accepted treasury disposition ballot does with the funds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum Disposition {
    Send,
    Burn,
    Freeze,
}

/// Components that can be hosted behind the versioned implementation
/// directory and therefore be the target of an implementation change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub enum GovernedComponent {
    KeysRegistry,
    ConsensusSet,
    BallotEngine,
    Thresholds,
    Treasury,
}

/// The four governance actions a ballot can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Action {
    /// Add, remove, or swap one of a validator's keys.
    KeyChange {
        target: KeyKind,
        change: ChangeKind,
        /// The key being added/removed, or the replacement key for a swap.
        affected_key: Pubkey,
        /// The owning mining key.  For mining-key changes this is the key
        /// being operated on (the old key for a swap).
        owner_mining_key: Pubkey,
    },

    /// Raise or lower the vote threshold for binary ballots.
    ThresholdChange { proposed_value: u64 },

    /// Point a governed component's implementation slot at a new address.
    ImplementationChange {
        proposed_address: Pubkey,
        target_component: GovernedComponent,
    },

    /// Dispose of the treasury balance.  `snapshot_amount` is captured from
    /// the treasury at ballot creation; `choice` records the winning
    /// disposition once the ballot finalizes (it starts as `Freeze`).
    TreasuryDisposition {
        receiver: Pubkey,
        snapshot_amount: u64,
        choice: Disposition,
    },
}

/// Discriminant of [`Action`], used for threshold lookups and events.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub enum ActionKind {
    KeyChange,
    ThresholdChange,
    ImplementationChange,
    TreasuryDisposition,
}

impl Action {
    /// The discriminant of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::KeyChange { .. } => ActionKind::KeyChange,
            Action::ThresholdChange { .. } => ActionKind::ThresholdChange,
            Action::ImplementationChange { .. } => ActionKind::ImplementationChange,
            Action::TreasuryDisposition { .. } => ActionKind::TreasuryDisposition,
        }
    }

    /// Whether this is a treasury disposition action.
    pub fn is_disposition(&self) -> bool {
        matches!(self, Action::TreasuryDisposition { .. })
    }
}

impl ActionKind {
    /// Binary actions tally a signed progress; the disposition action
    /// tallies three independent counters.
    pub fn is_binary(&self) -> bool {
        !matches!(self, ActionKind::TreasuryDisposition)
    }
}
