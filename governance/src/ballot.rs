//! Ballot records: one governance proposal with its voting window, tally,
//! and terminal state.
//!
//! Ballots are pure data; the lifecycle rules (creation checks, vote gating,
//! outcome computation, effect application) live in [`crate::engine`].

use {
    crate::action::Action,
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    solana_pubkey::Pubkey,
    std::collections::HashSet,
};

/// Outcome of a ballot's tally.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum QuorumState {
    #[default]
    InProgress,
    Accepted,
    Rejected,
    ThresholdNotReached,
}

/// A single vote.  Binary ballots take `Accept`/`Reject`; treasury
/// disposition ballots take one of the three disposition choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum VoteDecision {
    Accept,
    Reject,
    Send,
    Burn,
    Freeze,
}

impl VoteDecision {
    /// Whether this decision belongs to the binary accept/reject family.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Accept | Self::Reject)
    }
}

/// Running tally, shaped by the ballot's action kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Tally {
    /// Accepts minus rejects, plus the raw participation count.
    Binary { progress: i64, total_voters: u64 },
    /// One bucket per disposition choice.
    Disposition { send: u64, burn: u64, freeze: u64 },
}

impl Tally {
    pub fn total_voters(&self) -> u64 {
        match self {
            Self::Binary { total_voters, .. } => *total_voters,
            Self::Disposition { send, burn, freeze } => {
                send.saturating_add(*burn).saturating_add(*freeze)
            }
        }
    }
}

/// A governance proposal under vote.
#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Ballot {
    pub id: u64,
    pub start_time: u64,
    pub end_time: u64,
    /// Mining key of the creator.  Cancellation rights and the per-creator
    /// quota hang off this identity, not the voting key that signed.
    pub creator_mining_key: Pubkey,
    pub memo: String,
    pub action: Action,
    /// Quorum requirement captured at creation; later threshold changes do
    /// not retroactively affect this ballot.
    pub min_threshold_snapshot: u64,
    pub quorum_state: QuorumState,
    pub is_finalized: bool,
    pub is_canceled: bool,
    /// Mining keys that have voted.
    pub voters: HashSet<Pubkey>,
    pub tally: Tally,
    /// For disposition ballots: the emission release time displaced at
    /// creation, to be restored on cancel.
    pub release_time_restore: Option<u64>,
    pub created_at: u64,
}

impl Ballot {
    /// Whether `now` falls inside the (inclusive) voting window.
    pub fn in_window(&self, now: u64) -> bool {
        now >= self.start_time && now <= self.end_time
    }

    /// Terminal ballots accept no further votes or lifecycle calls.
    pub fn is_terminal(&self) -> bool {
        self.is_finalized || self.is_canceled
    }
}
