//! Data models for stations, reporters, votes and issue reports.

pub mod report;
pub mod reporter;
pub mod station;
pub mod vote;

pub use report::{IssueReport, NewIssueReport, ReportStatus};
pub use reporter::{Reporter, ReputationLevel};
pub use station::{Station, StationStatus, TrustLevel};
pub use vote::{NewVote, VerificationVote, VoteHistoryEntry, VoteValue};
