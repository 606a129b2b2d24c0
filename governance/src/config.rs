//! Governance configuration.
//!
//! Defines the protocol caps, the threshold floor, and the timing parameters
//! of treasury disposition ballots.  All times are in seconds; the core
//! never reads a clock, so callers supply `now` with every time-dependent
//! operation.

use {
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Configuration for the governance core.
#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct GovernanceConfig {
    /// Maximum number of bootstrap initial keys the master of ceremony may
    /// issue.  Default: 12.
    pub max_initial_keys: u64,

    /// Hard cap on the validator set size (pending list included).
    /// Default: 2000.
    pub max_validators: u64,

    /// Global active-ballot budget.  Each creator's quota is
    /// `max(ballot_cap / validator_count, 1)`, so the per-creator allowance
    /// shrinks automatically as the set grows.  Default: 200.
    pub ballot_cap: u64,

    /// Protocol floor for vote thresholds.  Default: 3.
    pub min_threshold: u64,

    /// Interval added to the emission release time whenever a treasury
    /// disposition ballot is created.  Default: 7_776_000 (90 days).
    pub emission_release_interval_secs: u64,

    /// Maximum `end - start` window of a treasury disposition ballot.
    /// Default: 604_800 (7 days).
    pub disposition_max_duration_secs: u64,

    /// Grace window after a disposition ballot's start during which the
    /// creator may cancel it.  Finalization of a disposition ballot is
    /// blocked for the same window.  Default: 900 (15 minutes).
    pub cancel_grace_secs: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            max_initial_keys: 12,
            max_validators: 2000,
            ballot_cap: 200,
            min_threshold: 3,
            emission_release_interval_secs: 7_776_000,
            disposition_max_duration_secs: 604_800,
            cancel_grace_secs: 900,
        }
    }
}

impl GovernanceConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_initial_keys == 0 {
            return Err(ConfigError::InvalidInitialKeyCap);
        }
        if self.max_validators == 0 {
            return Err(ConfigError::InvalidValidatorCap);
        }
        if self.ballot_cap == 0 {
            return Err(ConfigError::InvalidBallotCap);
        }
        if self.min_threshold == 0 {
            return Err(ConfigError::InvalidThresholdFloor);
        }
        if self.disposition_max_duration_secs <= self.cancel_grace_secs {
            return Err(ConfigError::DispositionWindowTooShort {
                max_duration: self.disposition_max_duration_secs,
                cancel_grace: self.cancel_grace_secs,
            });
        }
        Ok(())
    }
}

/// Errors in governance configuration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("max_initial_keys must be > 0")]
    InvalidInitialKeyCap,
    #[error("max_validators must be > 0")]
    InvalidValidatorCap,
    #[error("ballot_cap must be > 0")]
    InvalidBallotCap,
    #[error("min_threshold must be > 0")]
    InvalidThresholdFloor,
    #[error(
        "disposition_max_duration_secs ({max_duration}) must exceed cancel_grace_secs ({cancel_grace})"
    )]
    DispositionWindowTooShort {
        max_duration: u64,
        cancel_grace: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GovernanceConfig::default();
        assert_eq!(config.max_initial_keys, 12);
        assert_eq!(config.max_validators, 2000);
        assert_eq!(config.ballot_cap, 200);
        assert_eq!(config.min_threshold, 3);
        assert_eq!(config.cancel_grace_secs, 900);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_initial_key_cap_rejected() {
        let mut config = GovernanceConfig::default();
        config.max_initial_keys = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInitialKeyCap)
        ));
    }

    #[test]
    fn test_zero_validator_cap_rejected() {
        let mut config = GovernanceConfig::default();
        config.max_validators = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValidatorCap)
        ));
    }

    #[test]
    fn test_disposition_window_must_exceed_grace() {
        let mut config = GovernanceConfig::default();
        config.disposition_max_duration_secs = config.cancel_grace_secs;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DispositionWindowTooShort { .. })
        ));
    }
}
