//! Domain events.
//!
//! Every mutating operation returns the events it produced so the host can
//! forward them to indexers and downstream consumers.  Field order inside
//! each variant is part of the observability contract.

use {
    crate::{action::ActionKind, ballot::VoteDecision},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    solana_pubkey::Pubkey,
};

/// How a key changed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum KeyAction {
    Added,
    Removed,
    Swapped,
}

/// Externally visible governance events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum GovernanceEvent {
    /// A bootstrap initial key was issued by the master of ceremony.
    InitialKeyCreated {
        initial_key: Pubkey,
        time: u64,
        initial_keys_count: u64,
    },

    /// An initial key was consumed to create a full validator key set.
    ValidatorInitialized {
        mining_key: Pubkey,
        voting_key: Pubkey,
        payout_key: Pubkey,
    },

    /// A mining key was added, removed, or swapped.
    MiningKeyChanged { key: Pubkey, action: KeyAction },

    /// A voting key was added, removed, or swapped for `mining_key`.
    VotingKeyChanged {
        key: Pubkey,
        mining_key: Pubkey,
        action: KeyAction,
    },

    /// A payout key was added, removed, or swapped for `mining_key`.
    PayoutKeyChanged {
        key: Pubkey,
        mining_key: Pubkey,
        action: KeyAction,
    },

    /// A validator-set change was proposed; carries the full new pending
    /// list for the external block-producing engine to pick up.
    InitiateChange { new_pending_set: Vec<Pubkey> },

    /// The external engine confirmed the pending set; it is now current.
    ChangeFinalized { new_set: Vec<Pubkey> },

    /// A ballot was created.
    BallotCreated {
        id: u64,
        kind: ActionKind,
        creator: Pubkey,
    },

    /// A vote was cast.  `voter` is the voting key that signed the call;
    /// `voter_mining_key` is the identity the double-vote guard keys on.
    Vote {
        id: u64,
        decision: VoteDecision,
        voter: Pubkey,
        time: u64,
        voter_mining_key: Pubkey,
    },

    /// A ballot reached a terminal state (any outcome).
    BallotFinalized { id: u64, voter: Pubkey },

    /// A disposition ballot was canceled by its creator.
    BallotCanceled { id: u64, voter: Pubkey },
}
