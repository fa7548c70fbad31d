use serde::{Deserialize, Serialize};

/// How a tracker treats an incoming delta that is not itself 50/50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaPolicy {
    /// Reject the delta and leave totals untouched.
    #[default]
    Strict,
    /// Apply the delta and record it as unbalanced.
    Flag,
}

impl DeltaPolicy {
    #[must_use]
    pub const fn admits(self, balanced: bool) -> bool {
        balanced || matches!(self, DeltaPolicy::Flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_admits_only_balanced() {
        assert!(DeltaPolicy::Strict.admits(true));
        assert!(!DeltaPolicy::Strict.admits(false));
        assert!(DeltaPolicy::Flag.admits(false));
    }
}
