//! Governance Integration Tests
//!
//! End-to-end test suite for the proof-of-authority governance core.
//!
//! # Subsystems Tested
//!
//! 1. **Key lifecycle** — initial-key onboarding, key triple creation,
//!    rotation, swap history, tombstones
//! 2. **Consensus-set transitions** — two-phase initiate/finalize protocol,
//!    finalizer gating, master-of-ceremony handover
//! 3. **Ballot lifecycle** — creation rules, vote gating, quorum outcomes,
//!    threshold and implementation changes, quotas
//! 4. **Treasury ballots** — disposition voting, absolute majority, freeze
//!    fallback, cancellation and emission-release restore

pub mod harness;

#[cfg(test)]
mod key_lifecycle_tests;

#[cfg(test)]
mod consensus_transition_tests;
