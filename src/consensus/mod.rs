//! Crowd Consensus
//!
//! Votes are tallied per station over a trailing window. The tally drives the
//! station status policy and the reputation triggers.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────┐     ┌───────────────┐
//! │ votes        │────►│ ConsensusEvaluator │────►│ StatusPolicy  │
//! │ (store)      │     │ (trailing window)  │     │ (transitions) │
//! └──────────────┘     └────────────────────┘     └───────────────┘
//!                                │
//!                                ▼
//!                      ┌──────────────────────┐
//!                      │ ContradictionDetector│
//!                      │ (follow-up windows)  │
//!                      └──────────────────────┘
//! ```
//!
//! Tallies are recomputed on every call; nothing is cached or persisted.

mod contradiction;
mod evaluator;
mod policy;
mod tally;

pub use contradiction::{ContradictionDetector, contradicts};
pub use evaluator::ConsensusEvaluator;
pub use policy::{StatusPolicy, StatusTransition, TransitionCause};
pub use tally::{ConsensusTally, STRONG_VERIFIED_MIN_VOTES, VERIFIED_MIN_VOTES};
