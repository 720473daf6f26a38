use std::sync::atomic::{AtomicBool, Ordering};

/// Global switch for the confidence estimator
pub trait FeatureFlag: Send + Sync {
    fn is_enabled(&self) -> bool;
}

impl FeatureFlag for bool {
    fn is_enabled(&self) -> bool {
        *self
    }
}

impl FeatureFlag for AtomicBool {
    fn is_enabled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}
