//! Governance Test Harness
//!
//! Deterministic helpers for integration-testing the governance core:
//!
//! - Bootstrapping a governance instance with a master of ceremony,
//!   finalizer, and admin
//! - Onboarding any number of validators through the initial-key flow
//! - Driving ballot windows with explicit, test-controlled timestamps
//!
//! The harness does NOT emulate a host chain; it exercises the crate APIs
//! directly and leaves authentication and time entirely to the tests.

use {
    poa_governance::{
        Action, ChangeKind, Disposition, Governance, GovernanceConfig, GovernanceError,
        GovernanceEvent, KeyKind, VoteDecision,
    },
    solana_pubkey::Pubkey,
};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Genesis timestamp used by all harness instances.
pub const GENESIS_TIME: u64 = 1_000_000;

/// Default number of validators to onboard in a test network.
pub const DEFAULT_VALIDATOR_COUNT: usize = 4;

/// A ballot window used by most tests: opens an hour after genesis and
/// stays open for a day.
pub const BALLOT_START: u64 = GENESIS_TIME + 3_600;
pub const BALLOT_END: u64 = BALLOT_START + 86_400;

/// A timestamp strictly before `BALLOT_START`.
pub const BEFORE_WINDOW: u64 = GENESIS_TIME + 1;

/// A timestamp inside the ballot window.
pub const IN_WINDOW: u64 = BALLOT_START + 60;

/// A timestamp strictly after `BALLOT_END`.
pub const AFTER_WINDOW: u64 = BALLOT_END + 1;

// ─── Test validator ──────────────────────────────────────────────────────────

/// A test validator's key triple.
#[derive(Debug, Clone, Copy)]
pub struct TestValidator {
    pub mining: Pubkey,
    pub voting: Pubkey,
    pub payout: Pubkey,
}

impl TestValidator {
    pub fn new() -> Self {
        Self {
            mining: Pubkey::new_unique(),
            voting: Pubkey::new_unique(),
            payout: Pubkey::new_unique(),
        }
    }
}

impl Default for TestValidator {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

/// A bootstrapped governance instance with a set of onboarded validators.
pub struct GovernanceHarness {
    pub gov: Governance,
    pub moc: Pubkey,
    pub finalizer: Pubkey,
    pub admin: Pubkey,
    pub validators: Vec<TestValidator>,
}

impl GovernanceHarness {
    /// Bootstrap with `validator_count` onboarded, finalized validators.
    /// The master of ceremony stays in the consensus set alongside them.
    pub fn new(validator_count: usize) -> Self {
        Self::with_config(validator_count, GovernanceConfig::default())
    }

    pub fn with_config(validator_count: usize, config: GovernanceConfig) -> Self {
        init_logging();
        let moc = Pubkey::new_unique();
        let finalizer = Pubkey::new_unique();
        let admin = Pubkey::new_unique();
        let gov = Governance::new(config, moc, finalizer, admin, GENESIS_TIME)
            .expect("default config is valid");
        let mut harness = Self {
            gov,
            moc,
            finalizer,
            admin,
            validators: Vec::new(),
        };
        for _ in 0..validator_count {
            harness.onboard_validator();
        }
        if validator_count > 0 {
            harness.finalize_set();
        }
        harness
    }

    /// Run one validator through the full onboarding flow.  The set change
    /// is staged but not finalized.
    pub fn onboard_validator(&mut self) -> TestValidator {
        let initial = Pubkey::new_unique();
        self.gov
            .initiate_key(self.moc, initial, GENESIS_TIME)
            .expect("initial key creation");
        let validator = TestValidator::new();
        self.gov
            .create_keys(initial, validator.mining, validator.voting, validator.payout)
            .expect("key triple creation");
        self.validators.push(validator);
        validator
    }

    pub fn finalize_set(&mut self) {
        self.gov
            .finalize_change(self.finalizer)
            .expect("set finalization");
    }

    /// Create a ballot over the standard window, returning its id.
    pub fn create_ballot(
        &mut self,
        creator_voting: Pubkey,
        action: Action,
    ) -> Result<u64, GovernanceError> {
        self.gov
            .create_ballot(
                creator_voting,
                BALLOT_START,
                BALLOT_END,
                "test ballot".to_string(),
                action,
                GENESIS_TIME + 1,
            )
            .map(|(id, _)| id)
    }

    /// Cast the same decision from every onboarded validator.
    pub fn vote_all(
        &mut self,
        id: u64,
        decision: VoteDecision,
        now: u64,
    ) -> Result<Vec<GovernanceEvent>, GovernanceError> {
        let mut events = Vec::new();
        let votings: Vec<Pubkey> = self.validators.iter().map(|v| v.voting).collect();
        for voting in votings {
            events.extend(self.gov.vote(voting, id, decision, now)?);
        }
        Ok(events)
    }
}

// ─── Actions ─────────────────────────────────────────────────────────────────

/// A key-change action admitting a fresh mining key.
pub fn add_mining_action() -> (Action, Pubkey) {
    let key = Pubkey::new_unique();
    (
        Action::KeyChange {
            target: KeyKind::Mining,
            change: ChangeKind::Add,
            affected_key: key,
            owner_mining_key: Pubkey::default(),
        },
        key,
    )
}

/// A disposition action paying out to a fresh receiver.
pub fn disposition_action() -> (Action, Pubkey) {
    let receiver = Pubkey::new_unique();
    (
        Action::TreasuryDisposition {
            receiver,
            snapshot_amount: 0,
            choice: Disposition::Freeze,
        },
        receiver,
    )
}

// ─── Logging ─────────────────────────────────────────────────────────────────

/// Initialize env_logger once for test output.
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
