//! Top-level facade tying the registry, consensus set, thresholds,
//! treasury, proxy directory, and ballot engine into one state machine.
//!
//! The host is responsible for authentication: every operation takes the
//! verified caller identity as its first argument, and the facade only
//! checks that the identity holds the required role.  All operations are
//! atomic over the in-memory state; on error nothing has changed.

use {
    crate::{
        action::Action,
        ballot::{Ballot, VoteDecision},
        config::{ConfigError, GovernanceConfig},
        consensus_set::ConsensusSet,
        engine::{BallotDeps, BallotEngine},
        error::GovernanceError,
        events::GovernanceEvent,
        keys::{InitialKeyStatus, KeysRegistry, ValidatorRecord},
        proxy::ProxyDirectory,
        thresholds::Thresholds,
        treasury::Treasury,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    log::*,
    serde::{Deserialize, Serialize},
    solana_pubkey::Pubkey,
};

/// The whole governance state machine.
#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Governance {
    config: GovernanceConfig,
    /// Identity allowed to perform direct key administration and migration.
    admin: Pubkey,
    keys: KeysRegistry,
    set: ConsensusSet,
    thresholds: Thresholds,
    treasury: Treasury,
    proxy: ProxyDirectory,
    engine: BallotEngine,
}

impl Governance {
    /// Bootstrap a governance instance.  The first emission release is one
    /// interval after `genesis_time`.
    pub fn new(
        config: GovernanceConfig,
        master_of_ceremony: Pubkey,
        finalizer: Pubkey,
        admin: Pubkey,
        genesis_time: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let treasury = Treasury::new(
            genesis_time.saturating_add(config.emission_release_interval_secs),
            config.emission_release_interval_secs,
        );
        let thresholds = Thresholds::new(config.min_threshold);
        info!("governance bootstrapped, master of ceremony {master_of_ceremony}");
        Ok(Self {
            // The master of ceremony carries a mining-key record from the
            // start, so the role can later be retired or handed over through
            // the ordinary mining-key operations.
            keys: KeysRegistry::with_master_of_ceremony(master_of_ceremony),
            set: ConsensusSet::new(master_of_ceremony, finalizer),
            thresholds,
            treasury,
            proxy: ProxyDirectory::new(),
            engine: BallotEngine::new(),
            config,
            admin,
        })
    }

    // -- Accessors --

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn admin(&self) -> Pubkey {
        self.admin
    }

    pub fn keys(&self) -> &KeysRegistry {
        &self.keys
    }

    pub fn consensus_set(&self) -> &ConsensusSet {
        &self.set
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    pub fn proxy(&self) -> &ProxyDirectory {
        &self.proxy
    }

    pub fn engine(&self) -> &BallotEngine {
        &self.engine
    }

    pub fn ballot(&self, id: u64) -> Option<&Ballot> {
        self.engine.ballot(id)
    }

    // -- Onboarding --

    pub fn initiate_key(
        &mut self,
        caller: Pubkey,
        key: Pubkey,
        now: u64,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        self.keys
            .initiate_key(caller, key, now, &self.config, &self.set)
    }

    pub fn create_keys(
        &mut self,
        caller: Pubkey,
        mining_key: Pubkey,
        voting_key: Pubkey,
        payout_key: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        self.keys.create_keys(
            caller,
            mining_key,
            voting_key,
            payout_key,
            &mut self.set,
            &self.config,
        )
    }

    // -- Direct key administration (admin only) --

    pub fn add_mining_key(
        &mut self,
        caller: Pubkey,
        key: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        self.ensure_admin(caller)?;
        self.keys.add_mining_key(key, &mut self.set, &self.config)
    }

    pub fn remove_mining_key(
        &mut self,
        caller: Pubkey,
        key: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        self.ensure_admin(caller)?;
        self.keys.remove_mining_key(key, &mut self.set)
    }

    pub fn swap_mining_key(
        &mut self,
        caller: Pubkey,
        new_key: Pubkey,
        old_key: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        self.ensure_admin(caller)?;
        self.keys.swap_mining_key(new_key, old_key, &mut self.set)
    }

    pub fn set_voting_key(
        &mut self,
        caller: Pubkey,
        key: Pubkey,
        mining_key: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        self.ensure_admin(caller)?;
        self.keys.set_voting_key(key, mining_key)
    }

    pub fn remove_voting_key(
        &mut self,
        caller: Pubkey,
        mining_key: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        self.ensure_admin(caller)?;
        self.keys.remove_voting_key(mining_key)
    }

    pub fn set_payout_key(
        &mut self,
        caller: Pubkey,
        key: Pubkey,
        mining_key: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        self.ensure_admin(caller)?;
        self.keys.set_payout_key(key, mining_key)
    }

    pub fn remove_payout_key(
        &mut self,
        caller: Pubkey,
        mining_key: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        self.ensure_admin(caller)?;
        self.keys.remove_payout_key(mining_key)
    }

    // -- Consensus-set protocol --

    /// Confirm the pending validator set.  Called by the external engine
    /// under its finalizer identity.
    pub fn finalize_change(
        &mut self,
        caller: Pubkey,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        self.set.finalize(caller)
    }

    pub fn set_finalizer(
        &mut self,
        caller: Pubkey,
        finalizer: Pubkey,
    ) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        self.set.set_finalizer(finalizer);
        Ok(())
    }

    // -- Ballots --

    pub fn create_ballot(
        &mut self,
        caller: Pubkey,
        start_time: u64,
        end_time: u64,
        memo: String,
        action: Action,
        now: u64,
    ) -> Result<(u64, Vec<GovernanceEvent>), GovernanceError> {
        let mut deps = BallotDeps {
            config: &self.config,
            keys: &mut self.keys,
            set: &mut self.set,
            thresholds: &mut self.thresholds,
            treasury: &mut self.treasury,
            proxy: &mut self.proxy,
        };
        self.engine
            .create_ballot(caller, start_time, end_time, memo, action, now, &mut deps)
    }

    pub fn vote(
        &mut self,
        caller: Pubkey,
        id: u64,
        decision: VoteDecision,
        now: u64,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        let mut deps = BallotDeps {
            config: &self.config,
            keys: &mut self.keys,
            set: &mut self.set,
            thresholds: &mut self.thresholds,
            treasury: &mut self.treasury,
            proxy: &mut self.proxy,
        };
        self.engine.vote(caller, id, decision, now, &mut deps)
    }

    pub fn finalize_ballot(
        &mut self,
        caller: Pubkey,
        id: u64,
        now: u64,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        let mut deps = BallotDeps {
            config: &self.config,
            keys: &mut self.keys,
            set: &mut self.set,
            thresholds: &mut self.thresholds,
            treasury: &mut self.treasury,
            proxy: &mut self.proxy,
        };
        self.engine.finalize_ballot(caller, id, now, &mut deps)
    }

    pub fn cancel_ballot(
        &mut self,
        caller: Pubkey,
        id: u64,
        now: u64,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        let mut deps = BallotDeps {
            config: &self.config,
            keys: &mut self.keys,
            set: &mut self.set,
            thresholds: &mut self.thresholds,
            treasury: &mut self.treasury,
            proxy: &mut self.proxy,
        };
        self.engine.cancel_ballot(caller, id, now, &mut deps)
    }

    // -- Treasury --

    /// Credit emissions or external funding to the treasury.
    pub fn fund_treasury(&mut self, amount: u64) {
        self.treasury.fund(amount);
    }

    // -- Migration (admin only) --

    pub fn migrate_initial_key(
        &mut self,
        caller: Pubkey,
        key: Pubkey,
        status: InitialKeyStatus,
    ) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        self.keys.migrate_initial_key(key, status)
    }

    pub fn migrate_mining_key(
        &mut self,
        caller: Pubkey,
        mining_key: Pubkey,
        record: ValidatorRecord,
        previous_mining_key: Option<Pubkey>,
    ) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        self.keys
            .migrate_mining_key(mining_key, record, previous_mining_key)
    }

    pub fn migrate_ballot(
        &mut self,
        caller: Pubkey,
        ballot: Ballot,
    ) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        self.engine.migrate_ballot(ballot)
    }

    fn ensure_admin(&self, caller: Pubkey) -> Result<(), GovernanceError> {
        if caller != self.admin {
            return Err(GovernanceError::NotAdmin { caller });
        }
        Ok(())
    }
}
