//! Station Confidence Estimation
//!
//! A deterministic 0-100 score describing how reliable a station's data is,
//! derived from verification volume, unresolved issue reports and recency.
//! It shares nothing with reporter reputation: no ledger, no stored score.
//!
//! ```text
//! verification = min(total * 5, 20) + min(recent_7d * 5, 20)     0..=40
//! reports      = max(30 - unresolved_pending_30d * 10, 0)        0..=30
//! recency      = step(days since last activity)                   5..=30
//! total        = min(verification + reports + recency, 100)
//! ```

mod estimator;
mod flag;

pub use estimator::{
    ConfidenceComponents, ConfidenceEstimate, ConfidenceSignals, RECENT_REPORT_DAYS,
    RECENT_VERIFICATION_DAYS, StationConfidence, StationConfidenceEstimator, confidence_label,
    recency_score,
};
pub use flag::FeatureFlag;
