use std::time::Duration;

use crate::engine::timer::{TimerAlert, TimerView};
use crate::error::Action;
use crate::session::result::RoundStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Incentive,
}

/// A transient, self-dismissing message for the player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub severity: Severity,
    pub duration: Duration,
}

impl Notice {
    pub fn new(text: impl Into<String>, severity: Severity, duration_ms: u64) -> Self {
        Self {
            text: text.into(),
            severity,
            duration: Duration::from_millis(duration_ms),
        }
    }
}

/// Everything the presentation layer needs to react to. The controller
/// queues these; the UI drains them after each call.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    QuestionLoaded {
        index: usize,
        total: usize,
        text: String,
        options: [u32; 4],
    },
    TimerTick(TimerView),
    TimerAlert(TimerAlert),
    AnswerResolved {
        correct: bool,
        correct_index: Option<usize>,
        chosen_index: Option<usize>,
        points: u32,
    },
    AnswerRevealed {
        correct_index: Option<usize>,
    },
    /// Training retry: clear highlights and accept input again.
    OptionsReset,
    Celebrate,
    ReadAloud(String),
    Notice(Notice),
    ActionRejected {
        action: Action,
        cost: u32,
    },
    RoundComplete(RoundStats),
    TrainingComplete,
}
