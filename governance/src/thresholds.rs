//! Vote threshold provider.
//!
//! A pure lookup table from governance-action kind to the number of votes a
//! ballot needs.  Binary actions use stored values, mutable only through an
//! accepted threshold-change ballot.  Treasury disposition ballots instead
//! require an absolute majority of the current validator-set size, so their
//! bar is derived, not stored.

use {
    crate::{action::ActionKind, error::GovernanceError},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Per-action-kind vote thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Thresholds {
    key_change: u64,
    threshold_change: u64,
    implementation_change: u64,
    /// Protocol floor; stored values can never drop below it.
    floor: u64,
}

impl Thresholds {
    /// Create a threshold table with every binary kind at the floor.
    pub fn new(floor: u64) -> Self {
        Self {
            key_change: floor,
            threshold_change: floor,
            implementation_change: floor,
            floor,
        }
    }

    /// The number of votes a ballot of `kind` needs, given the current
    /// validator-set size.
    pub fn threshold_for(&self, kind: ActionKind, validator_count: u64) -> u64 {
        match kind {
            ActionKind::KeyChange => self.key_change,
            ActionKind::ThresholdChange => self.threshold_change,
            ActionKind::ImplementationChange => self.implementation_change,
            // Absolute majority of the current set.
            ActionKind::TreasuryDisposition => validator_count / 2 + 1,
        }
    }

    /// The protocol floor.
    pub fn floor(&self) -> u64 {
        self.floor
    }

    /// Set the stored threshold for one binary kind.
    ///
    /// The disposition bar is derived and cannot be set.
    pub fn set_threshold(&mut self, kind: ActionKind, value: u64) -> Result<(), GovernanceError> {
        if value < self.floor {
            return Err(GovernanceError::ThresholdBelowFloor {
                value,
                floor: self.floor,
            });
        }
        match kind {
            ActionKind::KeyChange => self.key_change = value,
            ActionKind::ThresholdChange => self.threshold_change = value,
            ActionKind::ImplementationChange => self.implementation_change = value,
            ActionKind::TreasuryDisposition => {
                return Err(GovernanceError::InvalidAction {
                    reason: "the treasury disposition bar is derived from the set size".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Set every binary kind to `value`.  A threshold-change ballot carries
    /// a single proposed value, which raises or lowers the bar uniformly.
    pub fn set_all(&mut self, value: u64) -> Result<(), GovernanceError> {
        self.set_threshold(ActionKind::KeyChange, value)?;
        self.set_threshold(ActionKind::ThresholdChange, value)?;
        self.set_threshold(ActionKind::ImplementationChange, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_at_floor() {
        let thresholds = Thresholds::new(3);
        assert_eq!(thresholds.threshold_for(ActionKind::KeyChange, 10), 3);
        assert_eq!(thresholds.threshold_for(ActionKind::ThresholdChange, 10), 3);
        assert_eq!(
            thresholds.threshold_for(ActionKind::ImplementationChange, 10),
            3
        );
    }

    #[test]
    fn test_disposition_bar_is_majority_of_set() {
        let thresholds = Thresholds::new(3);
        assert_eq!(
            thresholds.threshold_for(ActionKind::TreasuryDisposition, 4),
            3
        );
        assert_eq!(
            thresholds.threshold_for(ActionKind::TreasuryDisposition, 5),
            3
        );
        assert_eq!(
            thresholds.threshold_for(ActionKind::TreasuryDisposition, 6),
            4
        );
        // Degenerate empty set still yields a bar of 1.
        assert_eq!(
            thresholds.threshold_for(ActionKind::TreasuryDisposition, 0),
            1
        );
    }

    #[test]
    fn test_set_threshold_below_floor_rejected() {
        let mut thresholds = Thresholds::new(3);
        assert!(matches!(
            thresholds.set_threshold(ActionKind::KeyChange, 2),
            Err(GovernanceError::ThresholdBelowFloor { value: 2, floor: 3 })
        ));
    }

    #[test]
    fn test_set_all() {
        let mut thresholds = Thresholds::new(3);
        thresholds.set_all(5).unwrap();
        assert_eq!(thresholds.threshold_for(ActionKind::KeyChange, 10), 5);
        assert_eq!(thresholds.threshold_for(ActionKind::ThresholdChange, 10), 5);
        assert_eq!(
            thresholds.threshold_for(ActionKind::ImplementationChange, 10),
            5
        );
    }

    #[test]
    fn test_disposition_bar_not_settable() {
        let mut thresholds = Thresholds::new(3);
        assert!(thresholds
            .set_threshold(ActionKind::TreasuryDisposition, 5)
            .is_err());
    }
}
