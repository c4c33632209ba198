use thiserror::Error;

use crate::session::round::RoundPhase;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Answer,
    ExtendTime,
    RevealAnswer,
    ToggleMode,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Answer => "answer",
            Action::ExtendTime => "extend time",
            Action::RevealAnswer => "reveal answer",
            Action::ToggleMode => "toggle mode",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of a player intent. None of these is fatal; the controller's
/// state is unchanged whenever one is returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("not enough XP for {action}: need {cost}, have {balance}")]
    InsufficientXp {
        action: Action,
        cost: u32,
        balance: u32,
    },
    #[error("{action} is not available right now")]
    Unavailable { action: Action },
    #[error("cannot {action} while {}", phase.as_str())]
    InvalidTransition { action: Action, phase: RoundPhase },
    #[error("there are no saved mistakes to train")]
    NothingToTrain,
    #[error("only {produced} of {requested} unique questions could be generated")]
    GenerationExhausted { requested: usize, produced: usize },
}
