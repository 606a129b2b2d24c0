//! Validator key lifecycle: one-time initial keys handed out by the master
//! of ceremony, per-validator key triples (mining, voting, payout), and the
//! one-hop history left behind by mining-key swaps.
//!
//! The mining key is the validator's durable identity: the voting and payout
//! keys hang off it and can be rotated independently.  Removal never erases
//! a record; it clears the activity flags and leaves the last known key
//! values behind as a tombstone.

use {
    crate::{
        action::{ChangeKind, KeyKind},
        config::GovernanceConfig,
        consensus_set::{ConsensusSet, SetChange},
        error::GovernanceError,
        events::{GovernanceEvent, KeyAction},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    log::*,
    serde::{Deserialize, Serialize},
    solana_pubkey::Pubkey,
    std::collections::{HashMap, HashSet},
};

/// Lifecycle of a one-time onboarding key.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum InitialKeyStatus {
    #[default]
    NotCreated,
    Activated,
    Used,
}

/// Per-validator key triple with independent activity flags.
///
/// Inactive entries keep their last value so tombstones remain inspectable.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ValidatorRecord {
    pub voting_key: Pubkey,
    pub payout_key: Pubkey,
    pub mining_active: bool,
    pub voting_active: bool,
    pub payout_active: bool,
}

/// Registry of validator keys, keyed by mining key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct KeysRegistry {
    records: HashMap<Pubkey, ValidatorRecord>,
    /// Active voting key -> owning mining key.
    voting_to_mining: HashMap<Pubkey, Pubkey>,
    /// Active payout key -> owning mining key.
    payout_to_mining: HashMap<Pubkey, Pubkey>,
    /// New mining key -> the key it replaced (one hop only).
    mining_key_history: HashMap<Pubkey, Pubkey>,
    initial_keys: HashMap<Pubkey, InitialKeyStatus>,
    initial_keys_count: u64,
    migrated_initial: HashSet<Pubkey>,
    migrated_mining: HashSet<Pubkey>,
}

impl KeysRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with an active mining-key record for the master of
    /// ceremony, so the bootstrap identity can later be retired or replaced
    /// through the ordinary mining-key operations.
    pub fn with_master_of_ceremony(master_of_ceremony: Pubkey) -> Self {
        let mut registry = Self::default();
        registry.records.insert(
            master_of_ceremony,
            ValidatorRecord {
                mining_active: true,
                ..ValidatorRecord::default()
            },
        );
        registry
    }

    // -- Queries --

    pub fn validator_record(&self, mining_key: &Pubkey) -> Option<&ValidatorRecord> {
        self.records.get(mining_key)
    }

    pub fn is_mining_active(&self, mining_key: &Pubkey) -> bool {
        self.records
            .get(mining_key)
            .map(|r| r.mining_active)
            .unwrap_or(false)
    }

    pub fn is_voting_active(&self, mining_key: &Pubkey) -> bool {
        self.records
            .get(mining_key)
            .map(|r| r.voting_active)
            .unwrap_or(false)
    }

    pub fn is_payout_active(&self, mining_key: &Pubkey) -> bool {
        self.records
            .get(mining_key)
            .map(|r| r.payout_active)
            .unwrap_or(false)
    }

    /// The active voting key for `mining_key`, if one is set.
    pub fn voting_key(&self, mining_key: &Pubkey) -> Option<Pubkey> {
        self.records
            .get(mining_key)
            .filter(|r| r.voting_active)
            .map(|r| r.voting_key)
    }

    /// The active payout key for `mining_key`, if one is set.
    pub fn payout_key(&self, mining_key: &Pubkey) -> Option<Pubkey> {
        self.records
            .get(mining_key)
            .filter(|r| r.payout_active)
            .map(|r| r.payout_key)
    }

    /// Resolve an active voting key back to its owning mining key.
    ///
    /// This lookup is the backbone of vote accounting: ballots identify
    /// voters by mining key, so a voting-key rotation mid-ballot cannot
    /// grant a second vote.
    pub fn mining_key_by_voting(&self, voting_key: &Pubkey) -> Option<Pubkey> {
        self.voting_to_mining.get(voting_key).copied()
    }

    pub fn mining_key_by_payout(&self, payout_key: &Pubkey) -> Option<Pubkey> {
        self.payout_to_mining.get(payout_key).copied()
    }

    /// The mining key that `mining_key` replaced, if it was created by swap.
    pub fn previous_mining_key(&self, mining_key: &Pubkey) -> Option<Pubkey> {
        self.mining_key_history.get(mining_key).copied()
    }

    pub fn initial_key_status(&self, key: &Pubkey) -> InitialKeyStatus {
        self.initial_keys.get(key).copied().unwrap_or_default()
    }

    pub fn initial_keys_count(&self) -> u64 {
        self.initial_keys_count
    }

    // -- Onboarding --

    /// Hand out a one-time onboarding key.  Master of ceremony only.
    pub fn initiate_key(
        &mut self,
        caller: Pubkey,
        key: Pubkey,
        now: u64,
        config: &GovernanceConfig,
        set: &ConsensusSet,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        // The zero identity marks a vacated role and never names a caller.
        if caller == Pubkey::default() || caller != set.master_of_ceremony() {
            return Err(GovernanceError::NotMasterOfCeremony { caller });
        }
        if key == Pubkey::default() {
            return Err(GovernanceError::ZeroIdentity);
        }
        if key == set.master_of_ceremony() {
            return Err(GovernanceError::MocAsInitialKey);
        }
        if self.initial_keys.contains_key(&key) {
            return Err(GovernanceError::InitialKeyExists { key });
        }
        if self.initial_keys_count >= config.max_initial_keys {
            return Err(GovernanceError::InitialKeyCapReached {
                cap: config.max_initial_keys,
            });
        }
        self.initial_keys.insert(key, InitialKeyStatus::Activated);
        self.initial_keys_count = self.initial_keys_count.saturating_add(1);
        info!(
            "initial key {key} created ({} of {} allotted)",
            self.initial_keys_count, config.max_initial_keys
        );
        Ok(vec![GovernanceEvent::InitialKeyCreated {
            initial_key: key,
            time: now,
            initial_keys_count: self.initial_keys_count,
        }])
    }

    /// Burn an onboarding key into a full validator key triple and stage the
    /// new validator into the consensus set.
    pub fn create_keys(
        &mut self,
        caller: Pubkey,
        mining_key: Pubkey,
        voting_key: Pubkey,
        payout_key: Pubkey,
        set: &mut ConsensusSet,
        config: &GovernanceConfig,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        match self.initial_key_status(&caller) {
            InitialKeyStatus::Activated => {}
            InitialKeyStatus::Used => {
                return Err(GovernanceError::InitialKeyUsed { key: caller });
            }
            InitialKeyStatus::NotCreated => {
                return Err(GovernanceError::NotActivatedInitialKey { caller });
            }
        }
        for key in [mining_key, voting_key, payout_key] {
            if key == Pubkey::default() {
                return Err(GovernanceError::ZeroIdentity);
            }
        }
        if mining_key == voting_key
            || mining_key == payout_key
            || voting_key == payout_key
            || mining_key == caller
            || voting_key == caller
            || payout_key == caller
        {
            return Err(GovernanceError::DuplicateKeys);
        }
        if set.is_validator(&mining_key) {
            return Err(GovernanceError::AlreadyValidator { key: mining_key });
        }
        if let Some(&owner) = self.voting_to_mining.get(&voting_key) {
            return Err(GovernanceError::VotingKeyInUse {
                key: voting_key,
                owner,
            });
        }
        if let Some(&owner) = self.payout_to_mining.get(&payout_key) {
            return Err(GovernanceError::PayoutKeyInUse {
                key: payout_key,
                owner,
            });
        }
        if set.pending_len() >= config.max_validators {
            return Err(GovernanceError::ValidatorCapReached {
                cap: config.max_validators,
            });
        }
        let set_events = set.propose(SetChange::Add(mining_key))?;
        self.records.insert(
            mining_key,
            ValidatorRecord {
                voting_key,
                payout_key,
                mining_active: true,
                voting_active: true,
                payout_active: true,
            },
        );
        self.voting_to_mining.insert(voting_key, mining_key);
        self.payout_to_mining.insert(payout_key, mining_key);
        self.initial_keys.insert(caller, InitialKeyStatus::Used);
        info!("validator {mining_key} onboarded via initial key {caller}");
        let mut events = vec![GovernanceEvent::ValidatorInitialized {
            mining_key,
            voting_key,
            payout_key,
        }];
        events.extend(set_events);
        Ok(events)
    }

    // -- Mining-key lifecycle --

    /// Admit a bare mining key (no voting/payout keys yet).  Reactivates the
    /// tombstone if the key was a validator before.
    pub fn add_mining_key(
        &mut self,
        key: Pubkey,
        set: &mut ConsensusSet,
        config: &GovernanceConfig,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        if key == Pubkey::default() {
            return Err(GovernanceError::ZeroIdentity);
        }
        if set.is_validator(&key) {
            return Err(GovernanceError::AlreadyValidator { key });
        }
        if set.pending_len() >= config.max_validators {
            return Err(GovernanceError::ValidatorCapReached {
                cap: config.max_validators,
            });
        }
        let set_events = set.propose(SetChange::Add(key))?;
        let record = self.records.entry(key).or_default();
        record.mining_active = true;
        info!("mining key {key} added to the validator set");
        let mut events = vec![GovernanceEvent::MiningKeyChanged {
            key,
            action: KeyAction::Added,
        }];
        events.extend(set_events);
        Ok(events)
    }

    /// Retire a validator.  The record stays behind as a tombstone with the
    /// last known voting and payout keys; removing an already retired key is
    /// a no-op.
    pub fn remove_mining_key(
        &mut self,
        key: Pubkey,
        set: &mut ConsensusSet,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        let Some(record) = self.records.get(&key) else {
            return Err(GovernanceError::UnknownMiningKey { key });
        };
        if !record.mining_active {
            return Ok(vec![]);
        }
        let set_events = set.propose(SetChange::Remove(key))?;
        if let Some(record) = self.records.get_mut(&key) {
            if record.voting_active {
                self.voting_to_mining.remove(&record.voting_key);
            }
            if record.payout_active {
                self.payout_to_mining.remove(&record.payout_key);
            }
            record.mining_active = false;
            record.voting_active = false;
            record.payout_active = false;
        }
        info!("mining key {key} removed from the validator set");
        let mut events = vec![GovernanceEvent::MiningKeyChanged {
            key,
            action: KeyAction::Removed,
        }];
        events.extend(set_events);
        Ok(events)
    }

    /// Replace `old_key` with `new_key`, carrying the record (and its
    /// voting/payout keys) across and remembering the previous identity.
    pub fn swap_mining_key(
        &mut self,
        new_key: Pubkey,
        old_key: Pubkey,
        set: &mut ConsensusSet,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        if new_key == Pubkey::default() {
            return Err(GovernanceError::ZeroIdentity);
        }
        match self.records.get(&old_key) {
            None => return Err(GovernanceError::UnknownMiningKey { key: old_key }),
            Some(record) if !record.mining_active => {
                return Err(GovernanceError::MiningKeyNotActive { key: old_key });
            }
            Some(_) => {}
        }
        if set.is_validator(&new_key) || self.is_mining_active(&new_key) {
            return Err(GovernanceError::AlreadyValidator { key: new_key });
        }
        let set_events = set.propose(SetChange::Swap {
            old: old_key,
            new: new_key,
        })?;
        if let Some(record) = self.records.remove(&old_key) {
            if record.voting_active {
                self.voting_to_mining.insert(record.voting_key, new_key);
            }
            if record.payout_active {
                self.payout_to_mining.insert(record.payout_key, new_key);
            }
            self.records.insert(new_key, record);
        }
        self.mining_key_history.insert(new_key, old_key);
        info!("mining key {old_key} swapped for {new_key}");
        let mut events = vec![GovernanceEvent::MiningKeyChanged {
            key: new_key,
            action: KeyAction::Swapped,
        }];
        events.extend(set_events);
        Ok(events)
    }

    // -- Voting-key lifecycle --

    /// Attach or replace the voting key of an active validator.
    pub fn set_voting_key(
        &mut self,
        key: Pubkey,
        mining_key: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        if key == Pubkey::default() {
            return Err(GovernanceError::ZeroIdentity);
        }
        if let Some(&owner) = self.voting_to_mining.get(&key) {
            return Err(GovernanceError::VotingKeyInUse { key, owner });
        }
        if self.payout_to_mining.contains_key(&key)
            || self.records.contains_key(&key)
            || key == mining_key
        {
            return Err(GovernanceError::DuplicateKeys);
        }
        let record = match self.records.get_mut(&mining_key) {
            None => return Err(GovernanceError::UnknownMiningKey { key: mining_key }),
            Some(record) if !record.mining_active => {
                return Err(GovernanceError::MiningKeyNotActive { key: mining_key });
            }
            Some(record) => record,
        };
        let action = if record.voting_active {
            let old = record.voting_key;
            self.voting_to_mining.remove(&old);
            KeyAction::Swapped
        } else {
            KeyAction::Added
        };
        record.voting_key = key;
        record.voting_active = true;
        self.voting_to_mining.insert(key, mining_key);
        debug!("voting key of {mining_key} set to {key}");
        Ok(vec![GovernanceEvent::VotingKeyChanged {
            key,
            mining_key,
            action,
        }])
    }

    /// Detach the voting key of an active validator.  No-op if no voting key
    /// is attached.
    pub fn remove_voting_key(
        &mut self,
        mining_key: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        let record = match self.records.get_mut(&mining_key) {
            None => return Err(GovernanceError::UnknownMiningKey { key: mining_key }),
            Some(record) if !record.mining_active => {
                return Err(GovernanceError::MiningKeyNotActive { key: mining_key });
            }
            Some(record) => record,
        };
        if !record.voting_active {
            return Ok(vec![]);
        }
        let key = record.voting_key;
        record.voting_active = false;
        self.voting_to_mining.remove(&key);
        debug!("voting key {key} of {mining_key} removed");
        Ok(vec![GovernanceEvent::VotingKeyChanged {
            key,
            mining_key,
            action: KeyAction::Removed,
        }])
    }

    // -- Payout-key lifecycle --

    /// Attach or replace the payout key of an active validator.
    pub fn set_payout_key(
        &mut self,
        key: Pubkey,
        mining_key: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        if key == Pubkey::default() {
            return Err(GovernanceError::ZeroIdentity);
        }
        if let Some(&owner) = self.payout_to_mining.get(&key) {
            return Err(GovernanceError::PayoutKeyInUse { key, owner });
        }
        if self.voting_to_mining.contains_key(&key)
            || self.records.contains_key(&key)
            || key == mining_key
        {
            return Err(GovernanceError::DuplicateKeys);
        }
        let record = match self.records.get_mut(&mining_key) {
            None => return Err(GovernanceError::UnknownMiningKey { key: mining_key }),
            Some(record) if !record.mining_active => {
                return Err(GovernanceError::MiningKeyNotActive { key: mining_key });
            }
            Some(record) => record,
        };
        let action = if record.payout_active {
            let old = record.payout_key;
            record.payout_key = key;
            record.payout_active = true;
            self.payout_to_mining.remove(&old);
            KeyAction::Swapped
        } else {
            record.payout_key = key;
            record.payout_active = true;
            KeyAction::Added
        };
        self.payout_to_mining.insert(key, mining_key);
        debug!("payout key of {mining_key} set to {key}");
        Ok(vec![GovernanceEvent::PayoutKeyChanged {
            key,
            mining_key,
            action,
        }])
    }

    /// Detach the payout key of an active validator.  No-op if no payout key
    /// is attached.
    pub fn remove_payout_key(
        &mut self,
        mining_key: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        let record = match self.records.get_mut(&mining_key) {
            None => return Err(GovernanceError::UnknownMiningKey { key: mining_key }),
            Some(record) if !record.mining_active => {
                return Err(GovernanceError::MiningKeyNotActive { key: mining_key });
            }
            Some(record) => record,
        };
        if !record.payout_active {
            return Ok(vec![]);
        }
        let key = record.payout_key;
        record.payout_active = false;
        self.payout_to_mining.remove(&key);
        debug!("payout key {key} of {mining_key} removed");
        Ok(vec![GovernanceEvent::PayoutKeyChanged {
            key,
            mining_key,
            action: KeyAction::Removed,
        }])
    }

    // -- Ballot-side validation --

    /// Check that a key-change action would be applicable against the
    /// present registry state, without mutating anything.  Used when a
    /// ballot is created; the state may legitimately drift before the
    /// ballot finalizes.
    pub fn check_key_change(
        &self,
        target: KeyKind,
        change: ChangeKind,
        affected_key: Pubkey,
        owner_mining_key: Pubkey,
        set: &ConsensusSet,
        config: &GovernanceConfig,
    ) -> Result<(), GovernanceError> {
        match (target, change) {
            (KeyKind::Mining, ChangeKind::Add) => {
                if affected_key == Pubkey::default() {
                    return Err(GovernanceError::ZeroIdentity);
                }
                if set.is_validator(&affected_key) {
                    return Err(GovernanceError::AlreadyValidator { key: affected_key });
                }
                if set.pending_len() >= config.max_validators {
                    return Err(GovernanceError::ValidatorCapReached {
                        cap: config.max_validators,
                    });
                }
            }
            (KeyKind::Mining, ChangeKind::Remove) => {
                self.require_active_mining(&affected_key)?;
            }
            (KeyKind::Mining, ChangeKind::Swap) => {
                if affected_key == Pubkey::default() {
                    return Err(GovernanceError::ZeroIdentity);
                }
                self.require_active_mining(&owner_mining_key)?;
                if set.is_validator(&affected_key) || self.is_mining_active(&affected_key) {
                    return Err(GovernanceError::AlreadyValidator { key: affected_key });
                }
            }
            (KeyKind::Voting, ChangeKind::Add | ChangeKind::Swap) => {
                self.require_active_mining(&owner_mining_key)?;
                if affected_key == Pubkey::default() {
                    return Err(GovernanceError::ZeroIdentity);
                }
                if let Some(&owner) = self.voting_to_mining.get(&affected_key) {
                    return Err(GovernanceError::VotingKeyInUse {
                        key: affected_key,
                        owner,
                    });
                }
                if self.payout_to_mining.contains_key(&affected_key)
                    || self.records.contains_key(&affected_key)
                    || affected_key == owner_mining_key
                {
                    return Err(GovernanceError::DuplicateKeys);
                }
            }
            (KeyKind::Voting, ChangeKind::Remove) => {
                self.require_active_mining(&owner_mining_key)?;
                if self.voting_key(&owner_mining_key).is_none() {
                    return Err(GovernanceError::InvalidAction {
                        reason: format!("validator {owner_mining_key} has no active voting key"),
                    });
                }
            }
            (KeyKind::Payout, ChangeKind::Add | ChangeKind::Swap) => {
                self.require_active_mining(&owner_mining_key)?;
                if affected_key == Pubkey::default() {
                    return Err(GovernanceError::ZeroIdentity);
                }
                if let Some(&owner) = self.payout_to_mining.get(&affected_key) {
                    return Err(GovernanceError::PayoutKeyInUse {
                        key: affected_key,
                        owner,
                    });
                }
                if self.voting_to_mining.contains_key(&affected_key)
                    || self.records.contains_key(&affected_key)
                    || affected_key == owner_mining_key
                {
                    return Err(GovernanceError::DuplicateKeys);
                }
            }
            (KeyKind::Payout, ChangeKind::Remove) => {
                self.require_active_mining(&owner_mining_key)?;
                if self.payout_key(&owner_mining_key).is_none() {
                    return Err(GovernanceError::InvalidAction {
                        reason: format!("validator {owner_mining_key} has no active payout key"),
                    });
                }
            }
        }
        Ok(())
    }

    fn require_active_mining(&self, mining_key: &Pubkey) -> Result<(), GovernanceError> {
        match self.records.get(mining_key) {
            None => Err(GovernanceError::UnknownMiningKey { key: *mining_key }),
            Some(record) if !record.mining_active => {
                Err(GovernanceError::MiningKeyNotActive { key: *mining_key })
            }
            Some(_) => Ok(()),
        }
    }

    // -- Migration --

    /// Import an onboarding key from a previous registry deployment.
    pub fn migrate_initial_key(
        &mut self,
        key: Pubkey,
        status: InitialKeyStatus,
    ) -> Result<(), GovernanceError> {
        if self.migrated_initial.contains(&key) {
            return Err(GovernanceError::AlreadyMigrated { key });
        }
        if self.initial_keys.contains_key(&key) {
            return Err(GovernanceError::InitialKeyExists { key });
        }
        self.initial_keys.insert(key, status);
        self.initial_keys_count = self.initial_keys_count.saturating_add(1);
        self.migrated_initial.insert(key);
        info!("initial key {key} migrated with status {status:?}");
        Ok(())
    }

    /// Import a validator record from a previous registry deployment,
    /// rebuilding the reverse lookups for its active sub-keys.
    pub fn migrate_mining_key(
        &mut self,
        mining_key: Pubkey,
        record: ValidatorRecord,
        previous_mining_key: Option<Pubkey>,
    ) -> Result<(), GovernanceError> {
        if self.migrated_mining.contains(&mining_key) {
            return Err(GovernanceError::AlreadyMigrated { key: mining_key });
        }
        if self.records.contains_key(&mining_key) {
            return Err(GovernanceError::AlreadyValidator { key: mining_key });
        }
        if record.voting_active {
            if let Some(&owner) = self.voting_to_mining.get(&record.voting_key) {
                return Err(GovernanceError::VotingKeyInUse {
                    key: record.voting_key,
                    owner,
                });
            }
            self.voting_to_mining.insert(record.voting_key, mining_key);
        }
        if record.payout_active {
            if let Some(&owner) = self.payout_to_mining.get(&record.payout_key) {
                self.voting_to_mining.remove(&record.voting_key);
                return Err(GovernanceError::PayoutKeyInUse {
                    key: record.payout_key,
                    owner,
                });
            }
            self.payout_to_mining.insert(record.payout_key, mining_key);
        }
        self.records.insert(mining_key, record);
        if let Some(previous) = previous_mining_key {
            self.mining_key_history.insert(mining_key, previous);
        }
        self.migrated_mining.insert(mining_key);
        info!("validator record for {mining_key} migrated");
        Ok(())
    }
}
