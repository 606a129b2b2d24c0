//! Proof-of-Authority Governance Core
//!
//! This crate implements the on-chain governance state machine for a
//! proof-of-authority network: validator key lifecycle, the two-phase
//! consensus-set transition protocol, and a ballot engine through which the
//! validators govern themselves.
//!
//! # Key Properties
//!
//! - **Caller-supplied identity and time**: the host authenticates callers
//!   and stamps every call with the current time; the library never reads a
//!   clock or verifies a signature.
//! - **Events out, no I/O**: every state transition returns the
//!   [`events::GovernanceEvent`]s the host should publish, in the order the
//!   underlying effects happened.
//! - **Atomicity**: an operation that returns an error has changed nothing.
//! - **Identity stability**: votes, quotas, and cancellation rights are
//!   keyed by the validator's mining key, so voting-key rotations mid-ballot
//!   grant nothing.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                 Governance                      │
//! │  ┌──────────┐  ┌──────────────┐  ┌──────────┐  │
//! │  │  Keys    │  │  Consensus   │  │ Threshold│  │
//! │  │ Registry │  │     Set      │  │   Table  │  │
//! │  └──────────┘  └──────────────┘  └──────────┘  │
//! │  ┌──────────┐  ┌──────────────┐  ┌──────────┐  │
//! │  │ Treasury │  │    Proxy     │  │  Ballot  │  │
//! │  │          │  │  Directory   │  │  Engine  │  │
//! │  └──────────┘  └──────────────┘  └──────────┘  │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! The [`governance::Governance`] facade owns all six subsystems and is the
//! intended entry point; the subsystems are public for hosts that persist
//! or inspect them individually.

pub mod action;
pub mod ballot;
pub mod config;
pub mod consensus_set;
pub mod engine;
pub mod error;
pub mod events;
pub mod governance;
pub mod keys;
pub mod proxy;
pub mod thresholds;
pub mod treasury;

pub use {
    action::{Action, ActionKind, ChangeKind, Disposition, GovernedComponent, KeyKind},
    ballot::{Ballot, QuorumState, Tally, VoteDecision},
    config::{ConfigError, GovernanceConfig},
    consensus_set::{ConsensusSet, MocChange, SetChange, ValidatorStatus},
    engine::{BallotDeps, BallotEngine},
    error::{ErrorKind, GovernanceError},
    events::{GovernanceEvent, KeyAction},
    governance::Governance,
    keys::{InitialKeyStatus, KeysRegistry, ValidatorRecord},
    proxy::{ProxyDirectory, VersionedImplementation},
    thresholds::Thresholds,
    treasury::Treasury,
};
