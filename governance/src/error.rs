//! Errors for the PoA governance core.
//!
//! Every failure is a synchronous, atomic rejection of the whole operation:
//! when an operation returns an error, no state was mutated.  Variants carry
//! enough context for hosts to report the rejection without re-querying.

use {solana_pubkey::Pubkey, thiserror::Error};

/// Coarse classification of a [`GovernanceError`].
///
/// Hosts that implement retry/abort policy can match on the kind instead of
/// every variant.  `StateConflict` errors on terminal ballot states are the
/// only ones that can never succeed on retry with different arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong caller identity for a privileged operation.
    Authorization,
    /// Malformed key combination, zero/duplicate identity, inactive owner.
    Invariant,
    /// Ballot window malformed, vote outside window, finalize too early.
    Temporal,
    /// Bootstrap-key cap, active-ballot quota, or validator cap exceeded.
    Capacity,
    /// Double vote, double finalize, already-migrated key, terminal ballot.
    StateConflict,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    // -- Authorization ------------------------------------------------------
    #[error("caller {caller} is not the master of ceremony")]
    NotMasterOfCeremony { caller: Pubkey },

    #[error("caller {caller} is not the configured finalizer")]
    NotFinalizer { caller: Pubkey },

    #[error("caller {caller} is not the governance admin")]
    NotAdmin { caller: Pubkey },

    #[error("caller {caller} does not hold an active voting key")]
    NotActiveVotingKey { caller: Pubkey },

    #[error("caller {caller} is not an activated initial key")]
    NotActivatedInitialKey { caller: Pubkey },

    #[error("only the creator of ballot {id} may cancel it")]
    NotBallotCreator { id: u64 },

    // -- Invariant ----------------------------------------------------------
    #[error("the zero identity is not a valid key")]
    ZeroIdentity,

    #[error("mining, voting, and payout keys must be pairwise distinct")]
    DuplicateKeys,

    #[error("the master of ceremony cannot be issued an initial key")]
    MocAsInitialKey,

    #[error("{key} is already a validator")]
    AlreadyValidator { key: Pubkey },

    #[error("mining key {key} is not an active validator")]
    MiningKeyNotActive { key: Pubkey },

    #[error("mining key {key} is unknown to the registry")]
    UnknownMiningKey { key: Pubkey },

    #[error("initial key {key} is unknown to the registry")]
    UnknownInitialKey { key: Pubkey },

    #[error("voting key {key} is already bound to mining key {owner}")]
    VotingKeyInUse { key: Pubkey, owner: Pubkey },

    #[error("payout key {key} is already bound to mining key {owner}")]
    PayoutKeyInUse { key: Pubkey, owner: Pubkey },

    #[error("threshold value {value} is below the protocol floor {floor}")]
    ThresholdBelowFloor { value: u64, floor: u64 },

    #[error("proposed threshold {value} equals the current value")]
    ThresholdUnchanged { value: u64 },

    #[error("proposed implementation equals the current implementation")]
    ImplementationUnchanged,

    #[error("ballot {id} does not exist")]
    UnknownBallot { id: u64 },

    #[error("decision does not match the action kind of ballot {id}")]
    DecisionMismatch { id: u64 },

    #[error("cancel is only available for treasury disposition ballots")]
    NotDispositionBallot { id: u64 },

    #[error("invalid ballot action: {reason}")]
    InvalidAction { reason: String },

    // -- Temporal -----------------------------------------------------------
    #[error("ballot window is malformed: start {start} must precede end {end}")]
    WindowMalformed { start: u64, end: u64 },

    #[error("ballot start {start} is not in the future (now {now})")]
    StartNotInFuture { start: u64, now: u64 },

    #[error("disposition ballot start {start} precedes the emission release time {release}")]
    BeforeEmissionRelease { start: u64, release: u64 },

    #[error("disposition ballot window exceeds the maximum duration of {max} seconds")]
    WindowTooLong { max: u64 },

    #[error("vote at {now} is outside the ballot window [{start}, {end}]")]
    OutsideVotingWindow { now: u64, start: u64, end: u64 },

    #[error("ballot {id} cannot be finalized yet")]
    FinalizeTooEarly { id: u64 },

    #[error("the cancel window for ballot {id} has closed")]
    CancelWindowClosed { id: u64 },

    // -- Capacity -----------------------------------------------------------
    #[error("the initial key cap of {cap} has been reached")]
    InitialKeyCapReached { cap: u64 },

    #[error("the validator cap of {cap} has been reached")]
    ValidatorCapReached { cap: u64 },

    #[error("creator {creator} has reached its active ballot quota of {quota}")]
    BallotQuotaReached { creator: Pubkey, quota: u64 },

    // -- StateConflict ------------------------------------------------------
    #[error("initial key {key} was already initiated")]
    InitialKeyExists { key: Pubkey },

    #[error("initial key {key} was already used to create validator keys")]
    InitialKeyUsed { key: Pubkey },

    #[error("{voter} has already voted on ballot {id}")]
    AlreadyVoted { id: u64, voter: Pubkey },

    #[error("ballot {id} is already finalized")]
    BallotAlreadyFinalized { id: u64 },

    #[error("ballot {id} is already canceled")]
    BallotAlreadyCanceled { id: u64 },

    #[error("ballot {id} was already migrated")]
    BallotAlreadyMigrated { id: u64 },

    #[error("source key {key} was already migrated")]
    AlreadyMigrated { key: Pubkey },

    #[error("the consensus set is already finalized with no pending change")]
    NothingToFinalize,
}

impl GovernanceError {
    /// Coarse category of this error, for host retry/abort policy.
    pub fn kind(&self) -> ErrorKind {
        use GovernanceError::*;
        match self {
            NotMasterOfCeremony { .. }
            | NotFinalizer { .. }
            | NotAdmin { .. }
            | NotActiveVotingKey { .. }
            | NotActivatedInitialKey { .. }
            | NotBallotCreator { .. } => ErrorKind::Authorization,

            ZeroIdentity
            | DuplicateKeys
            | MocAsInitialKey
            | AlreadyValidator { .. }
            | MiningKeyNotActive { .. }
            | UnknownMiningKey { .. }
            | UnknownInitialKey { .. }
            | VotingKeyInUse { .. }
            | PayoutKeyInUse { .. }
            | ThresholdBelowFloor { .. }
            | ThresholdUnchanged { .. }
            | ImplementationUnchanged
            | UnknownBallot { .. }
            | DecisionMismatch { .. }
            | NotDispositionBallot { .. }
            | InvalidAction { .. } => ErrorKind::Invariant,

            WindowMalformed { .. }
            | StartNotInFuture { .. }
            | BeforeEmissionRelease { .. }
            | WindowTooLong { .. }
            | OutsideVotingWindow { .. }
            | FinalizeTooEarly { .. }
            | CancelWindowClosed { .. } => ErrorKind::Temporal,

            InitialKeyCapReached { .. }
            | ValidatorCapReached { .. }
            | BallotQuotaReached { .. } => ErrorKind::Capacity,

            InitialKeyExists { .. }
            | InitialKeyUsed { .. }
            | AlreadyVoted { .. }
            | BallotAlreadyFinalized { .. }
            | BallotAlreadyCanceled { .. }
            | BallotAlreadyMigrated { .. }
            | AlreadyMigrated { .. }
            | NothingToFinalize => ErrorKind::StateConflict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let caller = Pubkey::new_unique();
        assert_eq!(
            GovernanceError::NotMasterOfCeremony { caller }.kind(),
            ErrorKind::Authorization
        );
        assert_eq!(GovernanceError::ZeroIdentity.kind(), ErrorKind::Invariant);
        assert_eq!(
            GovernanceError::FinalizeTooEarly { id: 3 }.kind(),
            ErrorKind::Temporal
        );
        assert_eq!(
            GovernanceError::InitialKeyCapReached { cap: 12 }.kind(),
            ErrorKind::Capacity
        );
        assert_eq!(
            GovernanceError::BallotAlreadyFinalized { id: 0 }.kind(),
            ErrorKind::StateConflict
        );
    }

    #[test]
    fn test_messages_carry_context() {
        let err = GovernanceError::ThresholdBelowFloor { value: 1, floor: 3 };
        assert!(err.to_string().contains('1'));
        assert!(err.to_string().contains('3'));
    }
}
