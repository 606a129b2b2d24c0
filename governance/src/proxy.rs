//! Versioned implementation directory.
//!
//! Governed components may be hosted behind an upgradeable implementation
//! slot.  This directory records which address is current for each component
//! and a monotonic version counter; the low-level call-forwarding mechanism
//! lives in the host and is out of scope here.

use {
    crate::{action::GovernedComponent, error::GovernanceError},
    borsh::{BorshDeserialize, BorshSerialize},
    log::*,
    serde::{Deserialize, Serialize},
    solana_pubkey::Pubkey,
    std::collections::HashMap,
};

/// The current implementation of one governed component.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct VersionedImplementation {
    pub implementation: Pubkey,
    pub version: u64,
}

/// Directory of current implementations for every governed component.
#[derive(Debug, Clone, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ProxyDirectory {
    entries: HashMap<GovernedComponent, VersionedImplementation>,
}

impl ProxyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current implementation address of `component`, if one is set.
    pub fn implementation(&self, component: GovernedComponent) -> Option<Pubkey> {
        self.entries.get(&component).map(|e| e.implementation)
    }

    /// The version counter of `component` (0 before the first upgrade).
    pub fn version(&self, component: GovernedComponent) -> u64 {
        self.entries.get(&component).map(|e| e.version).unwrap_or(0)
    }

    /// Point `component` at `new_implementation`, bumping the version.
    ///
    /// Rejects the zero address and no-op upgrades to the current address.
    pub fn upgrade_to(
        &mut self,
        component: GovernedComponent,
        new_implementation: Pubkey,
    ) -> Result<u64, GovernanceError> {
        if new_implementation == Pubkey::default() {
            return Err(GovernanceError::ZeroIdentity);
        }
        if self.implementation(component) == Some(new_implementation) {
            return Err(GovernanceError::ImplementationUnchanged);
        }
        let entry = self
            .entries
            .entry(component)
            .or_insert(VersionedImplementation {
                implementation: Pubkey::default(),
                version: 0,
            });
        entry.implementation = new_implementation;
        entry.version = entry.version.saturating_add(1);
        info!(
            "component {component:?} upgraded to {new_implementation} (version {})",
            entry.version
        );
        Ok(entry.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_directory() {
        let proxy = ProxyDirectory::new();
        assert_eq!(proxy.implementation(GovernedComponent::KeysRegistry), None);
        assert_eq!(proxy.version(GovernedComponent::KeysRegistry), 0);
    }

    #[test]
    fn test_upgrade_bumps_version() {
        let mut proxy = ProxyDirectory::new();
        let first = Pubkey::new_unique();
        let second = Pubkey::new_unique();

        assert_eq!(
            proxy.upgrade_to(GovernedComponent::Treasury, first).unwrap(),
            1
        );
        assert_eq!(
            proxy.implementation(GovernedComponent::Treasury),
            Some(first)
        );

        assert_eq!(
            proxy
                .upgrade_to(GovernedComponent::Treasury, second)
                .unwrap(),
            2
        );
        assert_eq!(
            proxy.implementation(GovernedComponent::Treasury),
            Some(second)
        );
    }

    #[test]
    fn test_upgrade_rejects_zero_address() {
        let mut proxy = ProxyDirectory::new();
        assert!(matches!(
            proxy.upgrade_to(GovernedComponent::Treasury, Pubkey::default()),
            Err(GovernanceError::ZeroIdentity)
        ));
    }

    #[test]
    fn test_upgrade_rejects_unchanged_address() {
        let mut proxy = ProxyDirectory::new();
        let addr = Pubkey::new_unique();
        proxy.upgrade_to(GovernedComponent::Treasury, addr).unwrap();
        assert!(matches!(
            proxy.upgrade_to(GovernedComponent::Treasury, addr),
            Err(GovernanceError::ImplementationUnchanged)
        ));
    }

    #[test]
    fn test_components_are_independent() {
        let mut proxy = ProxyDirectory::new();
        proxy
            .upgrade_to(GovernedComponent::KeysRegistry, Pubkey::new_unique())
            .unwrap();
        assert_eq!(proxy.version(GovernedComponent::KeysRegistry), 1);
        assert_eq!(proxy.version(GovernedComponent::BallotEngine), 0);
    }
}
