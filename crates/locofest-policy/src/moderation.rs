/// Reports needed before an event is taken down.
pub const REPORT_THRESHOLD: usize = 150;

#[derive(Debug, Clone, Copy)]
pub struct ModerationPolicy {
    pub threshold: usize,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self { threshold: REPORT_THRESHOLD }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationVerdict {
    pub delete_target: bool,
}

impl ModerationPolicy {
    /// Inclusive: reaching the threshold is enough.
    pub fn evaluate(&self, report_count: usize) -> ModerationVerdict {
        ModerationVerdict {
            delete_target: report_count >= self.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        let policy = ModerationPolicy::default();
        assert!(!policy.evaluate(149).delete_target);
        assert!(policy.evaluate(150).delete_target);
        assert!(policy.evaluate(151).delete_target);
    }

    #[test]
    fn no_reports_keeps_target() {
        assert!(!ModerationPolicy::default().evaluate(0).delete_target);
    }
}
