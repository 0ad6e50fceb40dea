//! Phases of a sync attempt.

use std::fmt;

/// Where a sync attempt currently is.
///
/// ```text
/// Idle -> Fetching -> Fingerprinting -> Comparing -> Committing -> Committed
///                                                 \-> Skipping  -> Skipped
/// Fetching | Fingerprinting | Comparing | Committing -> Failed
/// ```
///
/// `Committed`, `Skipped` and `Failed` end an attempt; the next attempt
/// starts again at `Fetching`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Fingerprinting,
    Comparing,
    Committing,
    Committed,
    Skipping,
    Skipped,
    Failed,
}

impl SyncPhase {
    /// True for phases that end an attempt.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SyncPhase::Committed | SyncPhase::Skipped | SyncPhase::Failed
        )
    }

    /// Whether an attempt may move from `self` to `next`.
    pub fn can_transition_to(self, next: SyncPhase) -> bool {
        use SyncPhase::*;

        match (self, next) {
            (Idle, Fetching) => true,
            (from, Fetching) if from.is_terminal() => true,
            (Fetching, Fingerprinting) => true,
            (Fingerprinting, Comparing) => true,
            (Comparing, Committing) | (Comparing, Skipping) => true,
            (Committing, Committed) => true,
            (Skipping, Skipped) => true,
            (Fetching | Fingerprinting | Comparing | Committing, Failed) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Fetching => "fetching",
            SyncPhase::Fingerprinting => "fingerprinting",
            SyncPhase::Comparing => "comparing",
            SyncPhase::Committing => "committing",
            SyncPhase::Committed => "committed",
            SyncPhase::Skipping => "skipping",
            SyncPhase::Skipped => "skipped",
            SyncPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
