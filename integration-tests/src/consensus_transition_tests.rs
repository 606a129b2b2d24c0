//! Integration tests for the two-phase consensus-set transition protocol.

use {
    crate::harness::{GovernanceHarness, AFTER_WINDOW, IN_WINDOW},
    assert_matches::assert_matches,
    poa_governance::{
        Action, ChangeKind, GovernanceError, GovernanceEvent, KeyKind, VoteDecision,
    },
    solana_pubkey::Pubkey,
};

// ═══════════════════════════════════════════════════════════════════════════
//  1. Two-phase visibility
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_staged_change_invisible_until_finalized() {
    let mut hx = GovernanceHarness::new(1);
    let newcomer = hx.onboard_validator();

    // Staged: a validator, but not a finalized one.
    assert!(hx.gov.consensus_set().is_validator(&newcomer.mining));
    assert!(!hx
        .gov
        .consensus_set()
        .is_validator_finalized(&newcomer.mining));
    assert!(!hx
        .gov
        .consensus_set()
        .current()
        .contains(&newcomer.mining));

    hx.finalize_set();
    assert!(hx
        .gov
        .consensus_set()
        .is_validator_finalized(&newcomer.mining));
    assert!(hx.gov.consensus_set().current().contains(&newcomer.mining));
}

#[test]
fn test_initiate_change_event_carries_full_pending_set() {
    let mut hx = GovernanceHarness::new(1);
    let key = Pubkey::new_unique();
    let events = hx.gov.add_mining_key(hx.admin, key).unwrap();
    let initiate = events
        .iter()
        .find_map(|event| match event {
            GovernanceEvent::InitiateChange { new_pending_set } => Some(new_pending_set.clone()),
            _ => None,
        })
        .expect("set change announced");
    assert_eq!(initiate, hx.gov.consensus_set().pending().to_vec());
    assert!(initiate.contains(&key));
}

#[test]
fn test_batched_changes_finalize_together() {
    let mut hx = GovernanceHarness::new(2);
    let [a, b] = [hx.validators[0], hx.validators[1]];
    hx.gov.remove_mining_key(hx.admin, a.mining).unwrap();
    let replacement = Pubkey::new_unique();
    hx.gov
        .swap_mining_key(hx.admin, replacement, b.mining)
        .unwrap();

    // Both changes are still pending.
    assert!(hx.gov.consensus_set().current().contains(&a.mining));
    assert!(hx.gov.consensus_set().current().contains(&b.mining));

    let events = hx.gov.finalize_change(hx.finalizer).unwrap();
    assert_matches!(
        events.as_slice(),
        [GovernanceEvent::ChangeFinalized { new_set }]
            if !new_set.contains(&a.mining) && new_set.contains(&replacement)
    );
}

// ═══════════════════════════════════════════════════════════════════════════
//  2. Finalizer gating
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_only_finalizer_confirms() {
    let mut hx = GovernanceHarness::new(1);
    hx.gov.add_mining_key(hx.admin, Pubkey::new_unique()).unwrap();
    assert_matches!(
        hx.gov.finalize_change(hx.admin),
        Err(GovernanceError::NotFinalizer { .. })
    );
    hx.gov.finalize_change(hx.finalizer).unwrap();
}

#[test]
fn test_finalize_without_pending_change_rejected() {
    let mut hx = GovernanceHarness::new(1);
    assert_matches!(
        hx.gov.finalize_change(hx.finalizer),
        Err(GovernanceError::NothingToFinalize)
    );
}

#[test]
fn test_finalizer_identity_can_be_rotated() {
    let mut hx = GovernanceHarness::new(1);
    let new_finalizer = Pubkey::new_unique();
    hx.gov.set_finalizer(hx.admin, new_finalizer).unwrap();
    hx.gov.add_mining_key(hx.admin, Pubkey::new_unique()).unwrap();
    assert_matches!(
        hx.gov.finalize_change(hx.finalizer),
        Err(GovernanceError::NotFinalizer { .. })
    );
    hx.gov.finalize_change(new_finalizer).unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
//  3. Master-of-ceremony handover
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_moc_stays_in_set_alongside_validators() {
    let hx = GovernanceHarness::new(3);
    assert!(hx.gov.consensus_set().current().contains(&hx.moc));
    assert_eq!(hx.gov.consensus_set().current_len(), 4);
    assert_eq!(hx.gov.consensus_set().master_of_ceremony(), hx.moc);
}

#[test]
fn test_moc_handover_via_ballot() {
    let mut hx = GovernanceHarness::new(4);
    let successor = Pubkey::new_unique();
    let action = Action::KeyChange {
        target: KeyKind::Mining,
        change: ChangeKind::Swap,
        affected_key: successor,
        owner_mining_key: hx.moc,
    };
    let id = hx.create_ballot(hx.validators[0].voting, action).unwrap();
    hx.vote_all(id, VoteDecision::Accept, IN_WINDOW).unwrap();
    hx.gov
        .finalize_ballot(hx.validators[0].voting, id, AFTER_WINDOW)
        .unwrap();
    // The accepted swap staged both the membership and the role change.
    assert_eq!(hx.gov.consensus_set().master_of_ceremony(), hx.moc);
    hx.finalize_set();
    assert_eq!(hx.gov.consensus_set().master_of_ceremony(), successor);
    assert!(hx.gov.consensus_set().is_validator(&successor));
    assert!(!hx.gov.consensus_set().is_validator(&hx.moc));
    // The one-hop lineage records the handover.
    assert_eq!(hx.gov.keys().previous_mining_key(&successor), Some(hx.moc));
}

#[test]
fn test_moc_retirement_via_ballot() {
    let mut hx = GovernanceHarness::new(4);
    let action = Action::KeyChange {
        target: KeyKind::Mining,
        change: ChangeKind::Remove,
        affected_key: hx.moc,
        owner_mining_key: Pubkey::default(),
    };
    let id = hx.create_ballot(hx.validators[0].voting, action).unwrap();
    hx.vote_all(id, VoteDecision::Accept, IN_WINDOW).unwrap();
    hx.gov
        .finalize_ballot(hx.validators[0].voting, id, AFTER_WINDOW)
        .unwrap();
    hx.finalize_set();
    assert_eq!(
        hx.gov.consensus_set().master_of_ceremony(),
        Pubkey::default()
    );
    assert_eq!(hx.gov.consensus_set().current_len(), 4);
    assert!(!hx.gov.consensus_set().is_validator(&hx.moc));
}
