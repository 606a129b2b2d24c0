//! Integration tests for the validator key lifecycle.
//!
//! Covers the initial-key onboarding flow, the per-kind key rotations
//! driven through the admin surface, swap history, and tombstones.

use {
    crate::harness::{GovernanceHarness, GENESIS_TIME},
    assert_matches::assert_matches,
    poa_governance::{GovernanceConfig, GovernanceError, InitialKeyStatus},
    solana_pubkey::Pubkey,
};

// ═══════════════════════════════════════════════════════════════════════════
//  1. Onboarding
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_full_onboarding_flow() {
    let mut hx = GovernanceHarness::new(0);
    let initial = Pubkey::new_unique();
    hx.gov.initiate_key(hx.moc, initial, GENESIS_TIME).unwrap();
    assert_eq!(
        hx.gov.keys().initial_key_status(&initial),
        InitialKeyStatus::Activated
    );

    let mining = Pubkey::new_unique();
    let voting = Pubkey::new_unique();
    let payout = Pubkey::new_unique();
    hx.gov.create_keys(initial, mining, voting, payout).unwrap();

    assert_eq!(
        hx.gov.keys().initial_key_status(&initial),
        InitialKeyStatus::Used
    );
    assert!(hx.gov.keys().is_mining_active(&mining));
    assert_eq!(hx.gov.keys().voting_key(&mining), Some(voting));
    assert_eq!(hx.gov.keys().payout_key(&mining), Some(payout));
    assert_eq!(hx.gov.keys().mining_key_by_voting(&voting), Some(mining));
}

#[test]
fn test_only_moc_hands_out_initial_keys() {
    let mut hx = GovernanceHarness::new(1);
    let validator = hx.validators[0];
    assert_matches!(
        hx.gov
            .initiate_key(validator.mining, Pubkey::new_unique(), GENESIS_TIME),
        Err(GovernanceError::NotMasterOfCeremony { .. })
    );
}

#[test]
fn test_initial_key_cap_enforced() {
    let config = GovernanceConfig {
        max_initial_keys: 2,
        ..GovernanceConfig::default()
    };
    let mut hx = GovernanceHarness::with_config(0, config);
    for _ in 0..2 {
        hx.gov
            .initiate_key(hx.moc, Pubkey::new_unique(), GENESIS_TIME)
            .unwrap();
    }
    assert_matches!(
        hx.gov
            .initiate_key(hx.moc, Pubkey::new_unique(), GENESIS_TIME),
        Err(GovernanceError::InitialKeyCapReached { cap: 2 })
    );
}

#[test]
fn test_initial_key_is_single_use() {
    let mut hx = GovernanceHarness::new(0);
    let initial = Pubkey::new_unique();
    hx.gov.initiate_key(hx.moc, initial, GENESIS_TIME).unwrap();
    hx.gov
        .create_keys(
            initial,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        )
        .unwrap();
    assert_matches!(
        hx.gov.create_keys(
            initial,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        ),
        Err(GovernanceError::InitialKeyUsed { .. })
    );
}

// ═══════════════════════════════════════════════════════════════════════════
//  2. Rotation and swap history
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_voting_key_rotation_updates_reverse_lookup() {
    let mut hx = GovernanceHarness::new(1);
    let validator = hx.validators[0];
    let new_voting = Pubkey::new_unique();
    hx.gov
        .set_voting_key(hx.admin, new_voting, validator.mining)
        .unwrap();
    assert_eq!(hx.gov.keys().mining_key_by_voting(&validator.voting), None);
    assert_eq!(
        hx.gov.keys().mining_key_by_voting(&new_voting),
        Some(validator.mining)
    );
}

#[test]
fn test_mining_key_swap_keeps_one_hop_history() {
    let mut hx = GovernanceHarness::new(1);
    let validator = hx.validators[0];
    let second = Pubkey::new_unique();
    hx.gov
        .swap_mining_key(hx.admin, second, validator.mining)
        .unwrap();
    let third = Pubkey::new_unique();
    hx.gov.swap_mining_key(hx.admin, third, second).unwrap();

    // Each key remembers exactly one predecessor.
    assert_eq!(hx.gov.keys().previous_mining_key(&third), Some(second));
    assert_eq!(
        hx.gov.keys().previous_mining_key(&second),
        Some(validator.mining)
    );
    // The voting key follows the record through both swaps.
    assert_eq!(
        hx.gov.keys().mining_key_by_voting(&validator.voting),
        Some(third)
    );
}

#[test]
fn test_voting_key_cannot_be_shared() {
    let mut hx = GovernanceHarness::new(2);
    let [a, b] = [hx.validators[0], hx.validators[1]];
    assert_matches!(
        hx.gov.set_voting_key(hx.admin, a.voting, b.mining),
        Err(GovernanceError::VotingKeyInUse { .. })
    );
}

// ═══════════════════════════════════════════════════════════════════════════
//  3. Tombstones
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_removal_leaves_inspectable_tombstone() {
    let mut hx = GovernanceHarness::new(2);
    let validator = hx.validators[0];
    hx.gov.remove_mining_key(hx.admin, validator.mining).unwrap();

    let record = hx.gov.keys().validator_record(&validator.mining).unwrap();
    assert!(!record.mining_active);
    assert_eq!(record.voting_key, validator.voting);
    assert_eq!(record.payout_key, validator.payout);
    // The freed sub-keys may be claimed by someone else.
    let other = hx.validators[1];
    hx.gov
        .set_voting_key(hx.admin, validator.voting, other.mining)
        .unwrap();
}

#[test]
fn test_tombstone_reactivation() {
    let mut hx = GovernanceHarness::new(1);
    let validator = hx.validators[0];
    hx.gov.remove_mining_key(hx.admin, validator.mining).unwrap();
    hx.finalize_set();
    hx.gov.add_mining_key(hx.admin, validator.mining).unwrap();
    assert!(hx.gov.keys().is_mining_active(&validator.mining));
    // Sub-keys do not come back on their own.
    assert_eq!(hx.gov.keys().voting_key(&validator.mining), None);
}
