//! Authoritative validator membership and the two-phase commit with the
//! external block-producing engine.
//!
//! Key-registry mutations land in the *pending* list immediately and are
//! announced via an `InitiateChange` event.  The external engine observes
//! the announcement and, out of band, calls back into [`ConsensusSet::finalize`]
//! under its designated finalizer identity; only then does the pending list
//! become the *current* (authoritative) set.
//!
//! Removals use swap-with-last-then-truncate, so the pending list stays
//! dense at the cost of not preserving overall order: callers must not
//! depend on list order beyond index stability of untouched entries.

use {
    crate::{error::GovernanceError, events::GovernanceEvent},
    borsh::{BorshDeserialize, BorshSerialize},
    log::*,
    serde::{Deserialize, Serialize},
    solana_pubkey::Pubkey,
    std::collections::HashMap,
};

/// A proposed change to the validator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum SetChange {
    Add(Pubkey),
    Remove(Pubkey),
    Swap { old: Pubkey, new: Pubkey },
}

/// A staged change to the master-of-ceremony role, applied only at the next
/// finalize so the bootstrap identity never vanishes mid-transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum MocChange {
    Swap(Pubkey),
    Remove,
}

/// Per-identity membership state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ValidatorStatus {
    /// Member of the pending list (and possibly the current list).
    pub is_validator: bool,
    /// Member of the current list with no outstanding change affecting it.
    pub is_finalized: bool,
    /// Index into the pending list while `is_validator` is set.
    pub pending_index: usize,
}

/// The two-phase validator membership set.
#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ConsensusSet {
    /// Proposed membership, mutated immediately by `propose`.
    pending: Vec<Pubkey>,
    /// Authoritative membership, updated only by `finalize`.
    current: Vec<Pubkey>,
    /// Whether `current` reflects the latest proposal.
    finalized: bool,
    statuses: HashMap<Pubkey, ValidatorStatus>,
    master_of_ceremony: Pubkey,
    /// Staged master-of-ceremony transition, applied at the next finalize.
    pending_moc: Option<MocChange>,
    /// The external engine identity allowed to call `finalize`.
    finalizer: Pubkey,
}

impl ConsensusSet {
    /// Create a set bootstrapped with the master of ceremony as its only
    /// (not yet finalized) member.
    pub fn new(master_of_ceremony: Pubkey, finalizer: Pubkey) -> Self {
        let mut statuses = HashMap::new();
        statuses.insert(
            master_of_ceremony,
            ValidatorStatus {
                is_validator: true,
                is_finalized: false,
                pending_index: 0,
            },
        );
        Self {
            pending: vec![master_of_ceremony],
            current: vec![master_of_ceremony],
            finalized: false,
            statuses,
            master_of_ceremony,
            pending_moc: None,
            finalizer,
        }
    }

    // -- Queries --

    pub fn pending(&self) -> &[Pubkey] {
        &self.pending
    }

    pub fn current(&self) -> &[Pubkey] {
        &self.current
    }

    pub fn pending_len(&self) -> u64 {
        self.pending.len() as u64
    }

    pub fn current_len(&self) -> u64 {
        self.current.len() as u64
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn master_of_ceremony(&self) -> Pubkey {
        self.master_of_ceremony
    }

    pub fn finalizer(&self) -> Pubkey {
        self.finalizer
    }

    /// Membership state of `identity`, if it was ever a validator.
    pub fn status(&self, identity: &Pubkey) -> Option<&ValidatorStatus> {
        self.statuses.get(identity)
    }

    /// Whether `identity` is in the pending membership.
    pub fn is_validator(&self, identity: &Pubkey) -> bool {
        self.statuses
            .get(identity)
            .map(|s| s.is_validator)
            .unwrap_or(false)
    }

    /// True only if `identity` is in the current set and no pending change
    /// affecting it is outstanding.  Downstream consumers that must not act
    /// on unconfirmed validators use this.
    pub fn is_validator_finalized(&self, identity: &Pubkey) -> bool {
        self.statuses
            .get(identity)
            .map(|s| s.is_validator && s.is_finalized)
            .unwrap_or(false)
    }

    /// Swap the finalizer identity (host/bootstrap hook).
    pub fn set_finalizer(&mut self, finalizer: Pubkey) {
        self.finalizer = finalizer;
    }

    // -- Two-phase protocol --

    /// Stage a membership change in the pending list and announce it.
    ///
    /// Changes touching the master of ceremony additionally stage the role
    /// transition, which only applies at the next finalize.
    pub fn propose(&mut self, change: SetChange) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        match change {
            SetChange::Add(key) => {
                if key == Pubkey::default() {
                    return Err(GovernanceError::ZeroIdentity);
                }
                if self.is_validator(&key) {
                    return Err(GovernanceError::AlreadyValidator { key });
                }
                let status = self.statuses.entry(key).or_default();
                status.is_validator = true;
                status.is_finalized = false;
                status.pending_index = self.pending.len();
                self.pending.push(key);
            }
            SetChange::Remove(key) => {
                let index = match self.statuses.get(&key) {
                    Some(status) if status.is_validator => status.pending_index,
                    _ => return Err(GovernanceError::UnknownMiningKey { key }),
                };
                self.pending.swap_remove(index);
                // The previously last element now occupies the removed slot.
                if let Some(moved) = self.pending.get(index).copied() {
                    if let Some(moved_status) = self.statuses.get_mut(&moved) {
                        moved_status.pending_index = index;
                    }
                }
                if let Some(status) = self.statuses.get_mut(&key) {
                    status.is_validator = false;
                    status.is_finalized = false;
                    status.pending_index = 0;
                }
                if key == self.master_of_ceremony {
                    self.pending_moc = Some(MocChange::Remove);
                }
            }
            SetChange::Swap { old, new } => {
                if new == Pubkey::default() {
                    return Err(GovernanceError::ZeroIdentity);
                }
                if self.is_validator(&new) {
                    return Err(GovernanceError::AlreadyValidator { key: new });
                }
                let index = match self.statuses.get(&old) {
                    Some(status) if status.is_validator => status.pending_index,
                    _ => return Err(GovernanceError::UnknownMiningKey { key: old }),
                };
                self.pending[index] = new;
                let new_status = self.statuses.entry(new).or_default();
                new_status.is_validator = true;
                new_status.is_finalized = false;
                new_status.pending_index = index;
                if let Some(old_status) = self.statuses.get_mut(&old) {
                    old_status.is_validator = false;
                    old_status.is_finalized = false;
                    old_status.pending_index = 0;
                }
                if old == self.master_of_ceremony {
                    self.pending_moc = Some(MocChange::Swap(new));
                }
            }
        }
        self.finalized = false;
        debug!(
            "validator-set change proposed, pending list now has {} entries",
            self.pending.len()
        );
        Ok(vec![GovernanceEvent::InitiateChange {
            new_pending_set: self.pending.clone(),
        }])
    }

    /// Confirm the pending list.  Only the configured finalizer may call
    /// this, and only while a proposal is outstanding.
    pub fn finalize(&mut self, caller: Pubkey) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        if caller != self.finalizer {
            return Err(GovernanceError::NotFinalizer { caller });
        }
        if self.finalized {
            return Err(GovernanceError::NothingToFinalize);
        }
        self.current = self.pending.clone();
        self.finalized = true;
        for key in &self.current {
            if let Some(status) = self.statuses.get_mut(key) {
                status.is_finalized = true;
            }
        }
        // A staged master-of-ceremony transition applies here, atomically
        // with the membership confirmation.
        if let Some(change) = self.pending_moc.take() {
            self.master_of_ceremony = match change {
                MocChange::Swap(new) => new,
                MocChange::Remove => Pubkey::default(),
            };
            info!("master of ceremony is now {}", self.master_of_ceremony);
        }
        info!(
            "validator-set change finalized, {} current validators",
            self.current.len()
        );
        Ok(vec![GovernanceEvent::ChangeFinalized {
            new_set: self.current.clone(),
        }])
    }
}
