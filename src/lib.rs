//! ChargePulse
//!
//! Crowd-sourced verification inference for EV charging stations: turns
//! reporter votes into a station status, keeps a reputation ledger of who
//! agrees with the crowd, and estimates how much a station's data can be
//! trusted.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Daemon entrypoint (schema + retention sweep)
//! ├── config.rs      - Configuration management
//! ├── error.rs       - PulseError
//! ├── service.rs     - Exposed operations (submit, summary, history, ...)
//! ├── store.rs       - VerificationStore seam
//! ├── memory.rs      - In-process store backend
//! ├── models/        - Stations, reporters, votes, issue reports
//! ├── consensus/     - Consensus inference
//! │   ├── tally.rs        - Pure vote tally
//! │   ├── evaluator.rs    - Windowed station summary
//! │   ├── policy.rs       - Status inference state machine
//! │   └── contradiction.rs - Overturned vote detection
//! ├── reputation/    - Reputation ledger
//! │   ├── score.rs    - Score arithmetic & trigger rules
//! │   ├── event.rs    - Ledger events & award keys
//! │   ├── ledger.rs   - try_award orchestration
//! │   ├── triggers.rs - When to reward or penalize
//! │   └── dispatch.rs - Fire-and-forget spawning
//! ├── confidence/    - Feature-gated station confidence estimate
//! └── database/      - PostgreSQL persistence
//! ```

pub mod config;
pub mod confidence;
pub mod consensus;
pub mod database;
pub mod error;
pub mod memory;
pub mod models;
pub mod reputation;
pub mod service;
pub mod store;

// Re-export main types for convenience
pub use config::PulseConfig;
pub use confidence::{ConfidenceEstimate, FeatureFlag, StationConfidence};
pub use consensus::{ConsensusTally, StatusTransition, TransitionCause};
pub use database::DatabasePool;
pub use error::{PulseError, PulseResult};
pub use memory::MemoryStore;
pub use models::{
    IssueReport, ReportStatus, Reporter, ReputationLevel, Station, StationStatus, TrustLevel,
    VerificationVote, VoteHistoryEntry, VoteValue,
};
pub use reputation::{ReputationEvent, ReputationEventType, ReputationRules, ReputationScore};
pub use service::{ServiceSettings, VerificationReceipt, VerificationService};
pub use store::VerificationStore;
