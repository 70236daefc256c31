/// What to do when one file or one chunk fails and more work remains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure, keep going, and report it at the end.
    #[default]
    Continue,
    /// Stop at the first failure and surface it.
    FailFast,
}

impl FailurePolicy {
    pub fn from_fail_fast(fail_fast: bool) -> Self {
        if fail_fast {
            Self::FailFast
        } else {
            Self::Continue
        }
    }

    pub fn stops_on_failure(self) -> bool {
        self == Self::FailFast
    }
}
