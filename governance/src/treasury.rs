//! Treasury state and the emission release schedule.
//!
//! Holds the funds that treasury disposition ballots decide over, with
//! cumulative accounting of everything ever received, sent, and burned.
//! Creating a disposition ballot tentatively advances the emission release
//! time by one interval; canceling the ballot restores it.

use {
    borsh::{BorshDeserialize, BorshSerialize},
    log::*,
    serde::{Deserialize, Serialize},
    solana_pubkey::Pubkey,
    std::collections::HashMap,
};

/// The governance treasury.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Treasury {
    /// Current spendable balance.
    balance: u64,
    /// Cumulative amount ever received.
    total_received: u64,
    /// Cumulative amount ever sent to receivers.
    total_sent: u64,
    /// Cumulative amount ever burned.
    total_burned: u64,
    /// Per-receiver payout ledger.
    payouts: HashMap<Pubkey, u64>,
    /// Earliest time a disposition ballot may start.
    emission_release_time: u64,
    /// Interval the release time advances by per disposition ballot.
    emission_release_interval: u64,
}

impl Treasury {
    /// Create an empty treasury whose first emission release opens at
    /// `release_time`.
    pub fn new(release_time: u64, release_interval: u64) -> Self {
        Self {
            balance: 0,
            total_received: 0,
            total_sent: 0,
            total_burned: 0,
            payouts: HashMap::new(),
            emission_release_time: release_time,
            emission_release_interval: release_interval,
        }
    }

    /// Current spendable balance.
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Cumulative amount ever received.
    pub fn total_received(&self) -> u64 {
        self.total_received
    }

    /// Cumulative amount ever sent.
    pub fn total_sent(&self) -> u64 {
        self.total_sent
    }

    /// Cumulative amount ever burned.
    pub fn total_burned(&self) -> u64 {
        self.total_burned
    }

    /// Total amount ever sent to `receiver`.
    pub fn payout_to(&self, receiver: &Pubkey) -> u64 {
        self.payouts.get(receiver).copied().unwrap_or(0)
    }

    /// Earliest time a disposition ballot may start.
    pub fn emission_release_time(&self) -> u64 {
        self.emission_release_time
    }

    /// Credit funds to the treasury.
    pub fn fund(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
        self.total_received = self.total_received.saturating_add(amount);
        debug!("treasury funded with {amount}, balance now {}", self.balance);
    }

    /// Send up to `amount` to `receiver`.  The amount is clamped to the
    /// current balance so a snapshot taken at ballot creation can never
    /// overdraw.  Returns the amount actually sent.
    pub fn send(&mut self, receiver: Pubkey, amount: u64) -> u64 {
        let sent = amount.min(self.balance);
        self.balance -= sent;
        self.total_sent = self.total_sent.saturating_add(sent);
        *self.payouts.entry(receiver).or_default() += sent;
        info!("treasury sent {sent} to {receiver}");
        sent
    }

    /// Burn up to `amount`.  Returns the amount actually burned.
    pub fn burn(&mut self, amount: u64) -> u64 {
        let burned = amount.min(self.balance);
        self.balance -= burned;
        self.total_burned = self.total_burned.saturating_add(burned);
        info!("treasury burned {burned}");
        burned
    }

    /// Explicit no-op disposition: the funds stay where they are.
    pub fn freeze(&self) {
        info!("treasury funds frozen, balance {} unchanged", self.balance);
    }

    /// Advance the emission release time by one interval, returning the
    /// previous value so ballot cancellation can restore it.
    pub fn advance_release_time(&mut self) -> u64 {
        let previous = self.emission_release_time;
        self.emission_release_time = previous.saturating_add(self.emission_release_interval);
        previous
    }

    /// Restore a release time saved by [`Self::advance_release_time`].
    pub fn restore_release_time(&mut self, previous: u64) {
        self.emission_release_time = previous;
    }
}
