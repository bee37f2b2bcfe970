//! Small shared helpers

use std::time::{SystemTime, UNIX_EPOCH};

/// Time helpers used wherever components agree on unix-second timestamps
pub struct TimeUtils;

impl TimeUtils {
    /// Current unix time in whole seconds
    pub fn now_unix_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_after_2020() {
        assert!(TimeUtils::now_unix_secs() > 1_577_836_800);
    }
}
