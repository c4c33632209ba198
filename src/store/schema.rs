use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::round::Operation;
use crate::store::{KeyValueStore, load_or_default, save_best_effort};

pub const XP_KEY: &str = "player_xp";
pub const ERROR_LOG_KEY: &str = "error_log";
pub const HIGH_SCORES_KEY: &str = "high_scores";

/// Upper bound on any answer the generator produces (12⁵ is the largest),
/// with headroom. Saved mistakes above it can only come from a hand-edited
/// file.
pub const MAX_PLAUSIBLE_ANSWER: u32 = 1_000_000;

/// What the player answered. Timeouts are recorded with a sentinel rather
/// than a number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Submitted {
    Value(u32),
    Timeout,
}

impl std::fmt::Display for Submitted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Submitted::Value(v) => write!(f, "{v}"),
            Submitted::Timeout => write!(f, "time's up"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub question: String,
    pub correct_answer: u32,
    pub submitted: Submitted,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorLog(Vec<ErrorRecord>);

impl ErrorLog {
    pub fn push(&mut self, record: ErrorRecord) {
        self.0.push(record);
    }

    /// Remove the oldest record for `question`. Returns false if none matched.
    pub fn remove_first(&mut self, question: &str) -> bool {
        match self.0.iter().position(|r| r.question == question) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    /// The last `n` records, newest first.
    pub fn recent(&self, n: usize) -> Vec<&ErrorRecord> {
        self.0.iter().rev().take(n).collect()
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.0
    }

    /// Drop records whose answer is out of range. Returns how many were
    /// removed.
    pub fn discard_implausible(&mut self) -> usize {
        let before = self.0.len();
        self.0.retain(|r| r.correct_answer <= MAX_PLAUSIBLE_ANSWER);
        before - self.0.len()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighScores(BTreeMap<Operation, u64>);

impl HighScores {
    pub fn best(&self, operation: Operation) -> u64 {
        self.0.get(&operation).copied().unwrap_or(0)
    }

    /// Store `score` if it beats the current best. Returns true on a new record.
    pub fn record(&mut self, operation: Operation, score: u64) -> bool {
        if score > self.best(operation) {
            self.0.insert(operation, score);
            true
        } else {
            false
        }
    }

    /// Operations with a positive best, highest first.
    pub fn ranking(&self) -> Vec<(Operation, u64)> {
        let mut ranked: Vec<(Operation, u64)> = self
            .0
            .iter()
            .filter(|&(_, &s)| s > 0)
            .map(|(&op, &s)| (op, s))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Process-wide player data. Each field lives under its own key and is
/// flushed on its own after every change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerProfile {
    pub xp: u32,
    pub high_scores: HighScores,
    pub error_log: ErrorLog,
}

impl PlayerProfile {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut error_log: ErrorLog = load_or_default(store, ERROR_LOG_KEY);
        let discarded = error_log.discard_implausible();
        if discarded > 0 {
            tracing::warn!(discarded, "dropped saved mistakes with out-of-range answers");
        }
        Self {
            xp: load_or_default(store, XP_KEY),
            high_scores: load_or_default(store, HIGH_SCORES_KEY),
            error_log,
        }
    }

    pub fn flush_xp(&self, store: &dyn KeyValueStore) {
        save_best_effort(store, XP_KEY, &self.xp);
    }

    pub fn flush_high_scores(&self, store: &dyn KeyValueStore) {
        save_best_effort(store, HIGH_SCORES_KEY, &self.high_scores);
    }

    pub fn flush_error_log(&self, store: &dyn KeyValueStore) {
        save_best_effort(store, ERROR_LOG_KEY, &self.error_log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question: &str) -> ErrorRecord {
        ErrorRecord {
            question: question.to_string(),
            correct_answer: 4,
            submitted: Submitted::Timeout,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_remove_first_only_removes_one() {
        let mut log = ErrorLog::default();
        log.push(record("2 + 2 = ?"));
        log.push(record("3 + 1 = ?"));
        log.push(record("2 + 2 = ?"));
        assert!(log.remove_first("2 + 2 = ?"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.records().iter().filter(|r| r.question == "2 + 2 = ?").count(), 1);
        assert_eq!(log.records()[0].question, "3 + 1 = ?");
        assert!(!log.remove_first("9 + 9 = ?"));
    }

    #[test]
    fn test_load_drops_out_of_range_answers() {
        use crate::store::memory_store::MemoryStore;

        let mut log = ErrorLog::default();
        log.push(record("2 + 2 = ?"));
        log.push(ErrorRecord {
            correct_answer: u32::MAX,
            ..record("edited")
        });
        let store = MemoryStore::new();
        store.insert_raw(ERROR_LOG_KEY, &serde_json::to_string(&log).unwrap());

        let profile = PlayerProfile::load(&store);
        assert_eq!(profile.error_log.len(), 1);
        assert_eq!(profile.error_log.records()[0].question, "2 + 2 = ?");
    }

    #[test]
    fn test_recent_is_newest_first() {
        let mut log = ErrorLog::default();
        for i in 0..8 {
            log.push(record(&format!("{i} + 0 = ?")));
        }
        let recent: Vec<&str> = log.recent(5).iter().map(|r| r.question.as_str()).collect();
        assert_eq!(recent, vec!["7 + 0 = ?", "6 + 0 = ?", "5 + 0 = ?", "4 + 0 = ?", "3 + 0 = ?"]);
    }

    #[test]
    fn test_high_score_only_improves() {
        let mut scores = HighScores::default();
        assert!(scores.record(Operation::Addition, 1200));
        assert!(!scores.record(Operation::Addition, 1200));
        assert!(!scores.record(Operation::Addition, 800));
        assert_eq!(scores.best(Operation::Addition), 1200);
        assert!(scores.record(Operation::Addition, 1500));
    }

    #[test]
    fn test_ranking_sorted_and_skips_zero() {
        let mut scores = HighScores::default();
        scores.record(Operation::Root, 300);
        scores.record(Operation::Addition, 900);
        scores.record(Operation::Division, 450);
        scores.0.insert(Operation::Subtraction, 0);
        let ranking = scores.ranking();
        assert_eq!(
            ranking,
            vec![
                (Operation::Addition, 900),
                (Operation::Division, 450),
                (Operation::Root, 300)
            ]
        );
    }

    #[test]
    fn test_record_json_shape() {
        let r = ErrorRecord {
            question: "7 × 8 = ?".to_string(),
            correct_answer: 56,
            submitted: Submitted::Value(54),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["submitted"]["value"], 54);
        let timeout = serde_json::to_value(Submitted::Timeout).unwrap();
        assert_eq!(timeout, "timeout");
    }

    #[test]
    fn test_high_scores_keyed_by_operation_name() {
        let mut scores = HighScores::default();
        scores.record(Operation::Exponentiation, 700);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"exponentiation":700}"#);
        let back: HighScores = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scores);
    }
}
