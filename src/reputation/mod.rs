//! Reporter Reputation Ledger
//!
//! Rewards reporters who agree with settled consensus or file corroborated
//! issue reports, and penalizes reporters whose votes keep getting overturned.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ ReputationTriggers │────►│ ReputationLedger │────►│ VerificationStore│
//! │ (when to award)    │     │ (try_award)      │     │ (locked txn)     │
//! └────────────────────┘     └──────────────────┘     └──────────────────┘
//!          ▲
//!          │ spawned, best-effort
//! ┌────────────────────┐
//! │ dispatch           │
//! └────────────────────┘
//! ```
//!
//! ## Score Model
//!
//! - Score starts at 0 and never goes negative
//! - Level is NEW below 5, NORMAL from 5 to 9, TRUSTED from 10
//! - Every applied delta is an append-only event; an event key is applied at
//!   most once per window, checked against the persisted log under the
//!   reporter's row lock

mod dispatch;
mod event;
mod ledger;
mod score;
mod triggers;

pub use dispatch::{spawn_report_triggers, spawn_vote_triggers};
pub use event::{ReputationAward, ReputationEvent, ReputationEventType};
pub use ledger::ReputationLedger;
pub use score::{ReputationRules, ReputationScore, ScoreUpdate, apply_delta};
pub use triggers::ReputationTriggers;
