use chrono::{DateTime, Utc};

use crate::session::round::{GameMode, Level, Operation, RoundState};

/// Final numbers of a finished round, as shown on the result screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundStats {
    pub operation: Operation,
    pub level: Level,
    pub mode: GameMode,
    pub score: u64,
    pub hits: u32,
    pub misses: u32,
    pub best_streak: u32,
    pub xp_gained: u32,
    pub xp_total: u32,
    pub previous_best: u64,
    pub new_record: bool,
    pub has_saved_errors: bool,
    pub finished_at: DateTime<Utc>,
}

impl RoundStats {
    pub fn from_round(
        state: &RoundState,
        xp_total: u32,
        previous_best: u64,
        new_record: bool,
        has_saved_errors: bool,
    ) -> Self {
        Self {
            operation: state.operation,
            level: state.level,
            mode: state.mode,
            score: state.score,
            hits: state.hits,
            misses: state.misses,
            best_streak: state.max_consecutive_hits,
            xp_gained: state.xp_gained,
            xp_total,
            previous_best,
            new_record,
            has_saved_errors,
            finished_at: Utc::now(),
        }
    }

    pub fn accuracy(&self) -> f64 {
        let answered = self.hits + self.misses;
        if answered == 0 {
            return 0.0;
        }
        self.hits as f64 / answered as f64 * 100.0
    }

    pub fn summary(&self) -> String {
        if self.new_record {
            format!(
                "NEW RECORD! {} beats your previous best of {}.",
                self.score, self.previous_best
            )
        } else {
            format!(
                "{} did not beat your record of {}. Try again!",
                self.score, self.previous_best
            )
        }
    }
}
