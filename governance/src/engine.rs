//! Ballot lifecycle engine: creation, voting, finalization, cancellation,
//! and migration of in-flight ballots.
//!
//! The engine owns the ballot records but none of the governed state; every
//! lifecycle call borrows the rest of the system through [`BallotDeps`] and
//! returns the events the host should publish.  Callers are authenticated
//! by their *voting* key, while all per-validator accounting (double-vote
//! guard, creator quota, cancellation rights) is keyed by the resolved
//! *mining* key, so key rotations mid-ballot change nothing.
//!
//! Finalization sets the ballot's terminal state before applying the
//! accepted action, so an effect that feeds back into the engine can never
//! observe the ballot as still in progress.

use {
    crate::{
        action::{Action, ActionKind, ChangeKind, Disposition, KeyKind},
        ballot::{Ballot, QuorumState, Tally, VoteDecision},
        config::GovernanceConfig,
        consensus_set::ConsensusSet,
        error::GovernanceError,
        events::GovernanceEvent,
        keys::KeysRegistry,
        proxy::ProxyDirectory,
        thresholds::Thresholds,
        treasury::Treasury,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    log::*,
    serde::{Deserialize, Serialize},
    solana_pubkey::Pubkey,
    std::collections::{BTreeMap, BTreeSet, HashMap, HashSet},
};

/// Mutable view of the governed state a ballot lifecycle call may touch.
pub struct BallotDeps<'a> {
    pub config: &'a GovernanceConfig,
    pub keys: &'a mut KeysRegistry,
    pub set: &'a mut ConsensusSet,
    pub thresholds: &'a mut Thresholds,
    pub treasury: &'a mut Treasury,
    pub proxy: &'a mut ProxyDirectory,
}

/// Ballot store plus the bookkeeping needed for quotas and migration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BallotEngine {
    ballots: BTreeMap<u64, Ballot>,
    /// Ids of ballots that have not reached a terminal state.
    active: BTreeSet<u64>,
    /// Open-ballot count per creator mining key.
    active_by_creator: HashMap<Pubkey, u64>,
    next_ballot_id: u64,
    migrated: HashSet<u64>,
}

impl BallotEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Queries --

    pub fn ballot(&self, id: u64) -> Option<&Ballot> {
        self.ballots.get(&id)
    }

    pub fn active_ballot_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.active.iter().copied()
    }

    pub fn next_ballot_id(&self) -> u64 {
        self.next_ballot_id
    }

    /// How many ballots one validator may have open at once.
    pub fn quota(config: &GovernanceConfig, validator_count: u64) -> u64 {
        (config.ballot_cap / validator_count.max(1)).max(1)
    }

    pub fn open_ballots_of(&self, creator_mining_key: &Pubkey) -> u64 {
        self.active_by_creator
            .get(creator_mining_key)
            .copied()
            .unwrap_or(0)
    }

    // -- Lifecycle --

    /// Open a new ballot.  `caller` must be an active voting key; the
    /// ballot is attributed to its owning mining key.
    pub fn create_ballot(
        &mut self,
        caller: Pubkey,
        start_time: u64,
        end_time: u64,
        memo: String,
        mut action: Action,
        now: u64,
        deps: &mut BallotDeps,
    ) -> Result<(u64, Vec<GovernanceEvent>), GovernanceError> {
        let Some(creator) = deps.keys.mining_key_by_voting(&caller) else {
            return Err(GovernanceError::NotActiveVotingKey { caller });
        };
        if start_time >= end_time {
            return Err(GovernanceError::WindowMalformed {
                start: start_time,
                end: end_time,
            });
        }
        if start_time <= now {
            return Err(GovernanceError::StartNotInFuture {
                start: start_time,
                now,
            });
        }
        if action.is_disposition() {
            let release = deps.treasury.emission_release_time();
            if start_time < release {
                return Err(GovernanceError::BeforeEmissionRelease {
                    start: start_time,
                    release,
                });
            }
            if end_time.saturating_sub(start_time) > deps.config.disposition_max_duration_secs {
                return Err(GovernanceError::WindowTooLong {
                    max: deps.config.disposition_max_duration_secs,
                });
            }
        }
        let quota = Self::quota(deps.config, deps.set.current_len());
        if self.open_ballots_of(&creator) >= quota {
            return Err(GovernanceError::BallotQuotaReached { creator, quota });
        }
        self.check_action(&action, deps)?;

        // Disposition ballots snapshot the balance they will dispose of and
        // displace the emission release window for their duration.
        let mut release_time_restore = None;
        if let Action::TreasuryDisposition {
            snapshot_amount,
            choice,
            ..
        } = &mut action
        {
            *snapshot_amount = deps.treasury.balance();
            *choice = Disposition::Freeze;
            release_time_restore = Some(deps.treasury.advance_release_time());
        }

        let kind = action.kind();
        let min_threshold_snapshot = deps
            .thresholds
            .threshold_for(kind, deps.set.current_len());
        let tally = if kind.is_binary() {
            Tally::Binary {
                progress: 0,
                total_voters: 0,
            }
        } else {
            Tally::Disposition {
                send: 0,
                burn: 0,
                freeze: 0,
            }
        };
        let id = self.next_ballot_id;
        self.next_ballot_id = self.next_ballot_id.saturating_add(1);
        self.ballots.insert(
            id,
            Ballot {
                id,
                start_time,
                end_time,
                creator_mining_key: creator,
                memo,
                action,
                min_threshold_snapshot,
                quorum_state: QuorumState::InProgress,
                is_finalized: false,
                is_canceled: false,
                voters: HashSet::new(),
                tally,
                release_time_restore,
                created_at: now,
            },
        );
        self.active.insert(id);
        *self.active_by_creator.entry(creator).or_insert(0) += 1;
        info!("ballot {id} ({kind:?}) created by {creator}, window [{start_time}, {end_time}]");
        Ok((
            id,
            vec![GovernanceEvent::BallotCreated { id, kind, creator }],
        ))
    }

    /// Cast a vote.  Finalizes the ballot immediately once every current
    /// validator has voted (disposition ballots additionally wait out the
    /// cancellation grace period).
    pub fn vote(
        &mut self,
        caller: Pubkey,
        id: u64,
        decision: VoteDecision,
        now: u64,
        deps: &mut BallotDeps,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        let Some(voter_mining_key) = deps.keys.mining_key_by_voting(&caller) else {
            return Err(GovernanceError::NotActiveVotingKey { caller });
        };
        let Some(ballot) = self.ballots.get_mut(&id) else {
            return Err(GovernanceError::UnknownBallot { id });
        };
        if ballot.is_finalized {
            return Err(GovernanceError::BallotAlreadyFinalized { id });
        }
        if ballot.is_canceled {
            return Err(GovernanceError::BallotAlreadyCanceled { id });
        }
        if !ballot.in_window(now) {
            return Err(GovernanceError::OutsideVotingWindow {
                now,
                start: ballot.start_time,
                end: ballot.end_time,
            });
        }
        if ballot.voters.contains(&voter_mining_key) {
            return Err(GovernanceError::AlreadyVoted {
                id,
                voter: voter_mining_key,
            });
        }
        match (&mut ballot.tally, decision) {
            (
                Tally::Binary {
                    progress,
                    total_voters,
                },
                VoteDecision::Accept,
            ) => {
                *progress = progress.saturating_add(1);
                *total_voters = total_voters.saturating_add(1);
            }
            (
                Tally::Binary {
                    progress,
                    total_voters,
                },
                VoteDecision::Reject,
            ) => {
                *progress = progress.saturating_sub(1);
                *total_voters = total_voters.saturating_add(1);
            }
            (Tally::Disposition { send, .. }, VoteDecision::Send) => {
                *send = send.saturating_add(1);
            }
            (Tally::Disposition { burn, .. }, VoteDecision::Burn) => {
                *burn = burn.saturating_add(1);
            }
            (Tally::Disposition { freeze, .. }, VoteDecision::Freeze) => {
                *freeze = freeze.saturating_add(1);
            }
            _ => return Err(GovernanceError::DecisionMismatch { id }),
        }
        ballot.voters.insert(voter_mining_key);
        debug!("vote {decision:?} on ballot {id} by {voter_mining_key}");
        let mut events = vec![GovernanceEvent::Vote {
            id,
            decision,
            voter: caller,
            time: now,
            voter_mining_key,
        }];

        // Early finalize on full participation.  Disposition ballots stay
        // open through the cancellation grace period so the creator's
        // cancel right is not voted away.
        let grace_over = now
            >= ballot
                .start_time
                .saturating_add(deps.config.cancel_grace_secs);
        let full_participation = !deps.set.current().is_empty()
            && deps
                .set
                .current()
                .iter()
                .all(|validator| ballot.voters.contains(validator));
        let is_disposition = ballot.action.is_disposition();
        if full_participation && (!is_disposition || grace_over) {
            events.extend(self.finalize_inner(id, caller, deps)?);
        }
        Ok(events)
    }

    /// Finalize a ballot.  Any active voting key may call this once the
    /// window has closed; disposition ballots may also be finalized from
    /// the end of the cancellation grace period onward.
    pub fn finalize_ballot(
        &mut self,
        caller: Pubkey,
        id: u64,
        now: u64,
        deps: &mut BallotDeps,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        if deps.keys.mining_key_by_voting(&caller).is_none() {
            return Err(GovernanceError::NotActiveVotingKey { caller });
        }
        let Some(ballot) = self.ballots.get(&id) else {
            return Err(GovernanceError::UnknownBallot { id });
        };
        if ballot.is_finalized {
            return Err(GovernanceError::BallotAlreadyFinalized { id });
        }
        if ballot.is_canceled {
            return Err(GovernanceError::BallotAlreadyCanceled { id });
        }
        let grace_over = now
            >= ballot
                .start_time
                .saturating_add(deps.config.cancel_grace_secs);
        let window_over = now > ballot.end_time;
        if !window_over && !(ballot.action.is_disposition() && grace_over) {
            return Err(GovernanceError::FinalizeTooEarly { id });
        }
        self.finalize_inner(id, caller, deps)
    }

    /// Cancel a disposition ballot.  Only its creator may cancel, and only
    /// until the grace period after the window opens has elapsed.
    pub fn cancel_ballot(
        &mut self,
        caller: Pubkey,
        id: u64,
        now: u64,
        deps: &mut BallotDeps,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        let Some(caller_mining_key) = deps.keys.mining_key_by_voting(&caller) else {
            return Err(GovernanceError::NotActiveVotingKey { caller });
        };
        let Some(ballot) = self.ballots.get_mut(&id) else {
            return Err(GovernanceError::UnknownBallot { id });
        };
        if !ballot.action.is_disposition() {
            return Err(GovernanceError::NotDispositionBallot { id });
        }
        if ballot.is_finalized {
            return Err(GovernanceError::BallotAlreadyFinalized { id });
        }
        if ballot.is_canceled {
            return Err(GovernanceError::BallotAlreadyCanceled { id });
        }
        if caller_mining_key != ballot.creator_mining_key {
            return Err(GovernanceError::NotBallotCreator { id });
        }
        if now
            >= ballot
                .start_time
                .saturating_add(deps.config.cancel_grace_secs)
        {
            return Err(GovernanceError::CancelWindowClosed { id });
        }
        if let Some(previous) = ballot.release_time_restore.take() {
            deps.treasury.restore_release_time(previous);
        }
        ballot.is_canceled = true;
        let creator = ballot.creator_mining_key;
        self.active.remove(&id);
        self.release_creator_slot(&creator);
        info!("ballot {id} canceled by its creator {creator}");
        Ok(vec![GovernanceEvent::BallotCanceled { id, voter: caller }])
    }

    // -- Migration --

    /// Import a ballot record from a previous deployment.  Non-terminal
    /// ballots rejoin the active set and count against their creator's
    /// quota again.
    pub fn migrate_ballot(&mut self, ballot: Ballot) -> Result<(), GovernanceError> {
        let id = ballot.id;
        if self.migrated.contains(&id) || self.ballots.contains_key(&id) {
            return Err(GovernanceError::BallotAlreadyMigrated { id });
        }
        self.next_ballot_id = self.next_ballot_id.max(id.saturating_add(1));
        if !ballot.is_terminal() {
            self.active.insert(id);
            *self
                .active_by_creator
                .entry(ballot.creator_mining_key)
                .or_insert(0) += 1;
        }
        self.ballots.insert(id, ballot);
        self.migrated.insert(id);
        info!("ballot {id} migrated");
        Ok(())
    }

    // -- Internals --

    /// Validate that `action` is applicable against current state.  State
    /// may drift before the ballot finalizes; this only rejects proposals
    /// that are wrong on arrival.
    fn check_action(&self, action: &Action, deps: &BallotDeps) -> Result<(), GovernanceError> {
        match action {
            Action::KeyChange {
                target,
                change,
                affected_key,
                owner_mining_key,
            } => deps.keys.check_key_change(
                *target,
                *change,
                *affected_key,
                *owner_mining_key,
                deps.set,
                deps.config,
            ),
            Action::ThresholdChange { proposed_value } => {
                let floor = deps.thresholds.floor();
                if *proposed_value < floor {
                    return Err(GovernanceError::ThresholdBelowFloor {
                        value: *proposed_value,
                        floor,
                    });
                }
                let unchanged = [
                    ActionKind::KeyChange,
                    ActionKind::ThresholdChange,
                    ActionKind::ImplementationChange,
                ]
                .iter()
                .all(|kind| deps.thresholds.threshold_for(*kind, 0) == *proposed_value);
                if unchanged {
                    return Err(GovernanceError::ThresholdUnchanged {
                        value: *proposed_value,
                    });
                }
                Ok(())
            }
            Action::ImplementationChange {
                proposed_address,
                target_component,
            } => {
                if *proposed_address == Pubkey::default() {
                    return Err(GovernanceError::ZeroIdentity);
                }
                if deps.proxy.implementation(*target_component) == Some(*proposed_address) {
                    return Err(GovernanceError::ImplementationUnchanged);
                }
                Ok(())
            }
            Action::TreasuryDisposition { receiver, .. } => {
                if *receiver == Pubkey::default() {
                    return Err(GovernanceError::ZeroIdentity);
                }
                Ok(())
            }
        }
    }

    /// Compute the outcome, set the ballot's terminal state, then apply the
    /// accepted action.  The flags go first: an effect that re-enters the
    /// engine sees the ballot already finalized.
    fn finalize_inner(
        &mut self,
        id: u64,
        finalizer: Pubkey,
        deps: &mut BallotDeps,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        let Some(ballot) = self.ballots.get_mut(&id) else {
            return Err(GovernanceError::UnknownBallot { id });
        };
        let snapshot = ballot.min_threshold_snapshot;
        let (quorum_state, winner) = match &ballot.tally {
            Tally::Binary {
                progress,
                total_voters,
            } => {
                let state = if *total_voters < snapshot {
                    QuorumState::ThresholdNotReached
                } else if *progress > 0 {
                    QuorumState::Accepted
                } else {
                    QuorumState::Rejected
                };
                (state, None)
            }
            Tally::Disposition { send, burn, freeze } => {
                // The bar is a majority of the set size snapshotted at
                // creation.  If the set grows mid-ballot more than one
                // bucket can reach it; an ambiguous outcome freezes the
                // balance like a missed threshold does.
                let mut winner = None;
                let mut reached = 0u32;
                for (votes, choice) in [
                    (*send, Disposition::Send),
                    (*burn, Disposition::Burn),
                    (*freeze, Disposition::Freeze),
                ] {
                    if votes >= snapshot {
                        winner = Some(choice);
                        reached += 1;
                    }
                }
                if reached == 1 {
                    (QuorumState::Accepted, winner)
                } else {
                    (QuorumState::ThresholdNotReached, None)
                }
            }
        };
        ballot.quorum_state = quorum_state;
        ballot.is_finalized = true;
        if let (Action::TreasuryDisposition { choice, .. }, Some(winner)) =
            (&mut ballot.action, winner)
        {
            *choice = winner;
        }
        let action = ballot.action.clone();
        let creator = ballot.creator_mining_key;
        self.active.remove(&id);
        self.release_creator_slot(&creator);
        info!("ballot {id} finalized as {quorum_state:?}");

        let mut events = Vec::new();
        if quorum_state == QuorumState::Accepted {
            match self.apply_action(&action, deps) {
                Ok(effect_events) => events.extend(effect_events),
                Err(err) => {
                    // State drifted since creation; the ballot stays
                    // finalized and the effect is dropped.
                    warn!("ballot {id} accepted but its action no longer applies: {err}");
                }
            }
        }
        events.push(GovernanceEvent::BallotFinalized {
            id,
            voter: finalizer,
        });
        Ok(events)
    }

    fn apply_action(
        &mut self,
        action: &Action,
        deps: &mut BallotDeps,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        match action {
            Action::KeyChange {
                target,
                change,
                affected_key,
                owner_mining_key,
            } => match (target, change) {
                (KeyKind::Mining, ChangeKind::Add) => {
                    deps.keys.add_mining_key(*affected_key, deps.set, deps.config)
                }
                (KeyKind::Mining, ChangeKind::Remove) => {
                    deps.keys.remove_mining_key(*affected_key, deps.set)
                }
                (KeyKind::Mining, ChangeKind::Swap) => {
                    deps.keys
                        .swap_mining_key(*affected_key, *owner_mining_key, deps.set)
                }
                (KeyKind::Voting, ChangeKind::Add | ChangeKind::Swap) => {
                    deps.keys.set_voting_key(*affected_key, *owner_mining_key)
                }
                (KeyKind::Voting, ChangeKind::Remove) => {
                    deps.keys.remove_voting_key(*owner_mining_key)
                }
                (KeyKind::Payout, ChangeKind::Add | ChangeKind::Swap) => {
                    deps.keys.set_payout_key(*affected_key, *owner_mining_key)
                }
                (KeyKind::Payout, ChangeKind::Remove) => {
                    deps.keys.remove_payout_key(*owner_mining_key)
                }
            },
            Action::ThresholdChange { proposed_value } => {
                deps.thresholds.set_all(*proposed_value)?;
                Ok(vec![])
            }
            Action::ImplementationChange {
                proposed_address,
                target_component,
            } => {
                deps.proxy.upgrade_to(*target_component, *proposed_address)?;
                Ok(vec![])
            }
            Action::TreasuryDisposition {
                receiver,
                snapshot_amount,
                choice,
            } => {
                match choice {
                    Disposition::Send => {
                        deps.treasury.send(*receiver, *snapshot_amount);
                    }
                    Disposition::Burn => {
                        deps.treasury.burn(*snapshot_amount);
                    }
                    Disposition::Freeze => deps.treasury.freeze(),
                }
                Ok(vec![])
            }
        }
    }

    fn release_creator_slot(&mut self, creator: &Pubkey) {
        if let Some(count) = self.active_by_creator.get_mut(creator) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.active_by_creator.remove(creator);
            }
        }
    }
}
