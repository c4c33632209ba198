use serde::{Deserialize, Serialize};

use crate::generator::Question;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Exponentiation,
    Root,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Addition,
        Operation::Subtraction,
        Operation::Multiplication,
        Operation::Division,
        Operation::Exponentiation,
        Operation::Root,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Addition => "addition",
            Operation::Subtraction => "subtraction",
            Operation::Multiplication => "multiplication",
            Operation::Division => "division",
            Operation::Exponentiation => "exponentiation",
            Operation::Root => "root",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Operation::Addition => "Addition",
            Operation::Subtraction => "Subtraction",
            Operation::Multiplication => "Multiplication",
            Operation::Division => "Division",
            Operation::Exponentiation => "Powers",
            Operation::Root => "Roots",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Addition => "+",
            Operation::Subtraction => "-",
            Operation::Multiplication => "×",
            Operation::Division => "÷",
            Operation::Exponentiation => "xⁿ",
            Operation::Root => "√",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Easy,
    Medium,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Easy, Level::Medium, Level::Advanced];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Easy => "easy",
            Level::Medium => "medium",
            Level::Advanced => "advanced",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Easy => "Easy",
            Level::Medium => "Medium",
            Level::Advanced => "Advanced",
        }
    }

    /// Score multiplier applied to the base points of a correct answer.
    pub fn multiplier(self) -> f64 {
        match self {
            Level::Easy => 1.0,
            Level::Medium => 1.5,
            Level::Advanced => 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameMode {
    Rapid,
    Study,
    ErrorTraining,
}

impl GameMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Rapid => "rapid",
            GameMode::Study => "study",
            GameMode::ErrorTraining => "training",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GameMode::Rapid => "Rapid",
            GameMode::Study => "Study",
            GameMode::ErrorTraining => "Error Training",
        }
    }

    /// Only rapid rounds run a countdown, award score and open the XP actions.
    pub fn is_timed(self) -> bool {
        matches!(self, GameMode::Rapid)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundPhase {
    NotStarted,
    Answering,
    Resolving,
    Complete,
}

impl RoundPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RoundPhase::NotStarted => "not-started",
            RoundPhase::Answering => "answering",
            RoundPhase::Resolving => "resolving",
            RoundPhase::Complete => "complete",
        }
    }
}

pub struct RoundState {
    pub operation: Operation,
    pub level: Level,
    pub mode: GameMode,
    pub phase: RoundPhase,
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub current_correct_answer: Option<u32>,
    pub options: [u32; 4],
    pub consecutive_errors: u32,
    pub consecutive_hits: u32,
    pub max_consecutive_hits: u32,
    pub hits: u32,
    pub misses: u32,
    pub score: u64,
    pub xp_gained: u32,
}

impl RoundState {
    pub fn new(operation: Operation, level: Level, mode: GameMode) -> Self {
        Self {
            operation,
            level,
            mode,
            phase: RoundPhase::NotStarted,
            questions: Vec::new(),
            current_index: 0,
            current_correct_answer: None,
            options: [0; 4],
            consecutive_errors: 0,
            consecutive_hits: 0,
            max_consecutive_hits: 0,
            hits: 0,
            misses: 0,
            score: 0,
            xp_gained: 0,
        }
    }

    /// Fresh round over `questions`: every counter goes back to zero.
    pub fn begin(&mut self, operation: Operation, level: Level, mode: GameMode, questions: Vec<Question>) {
        *self = Self::new(operation, level, mode);
        self.questions = questions;
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn is_finished(&self) -> bool {
        self.current_index >= self.questions.len()
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Index of the option matching the correct answer, if it is on screen.
    pub fn correct_option_index(&self) -> Option<usize> {
        let answer = self.current_correct_answer?;
        self.options.iter().position(|&o| o == answer)
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.consecutive_hits += 1;
        self.consecutive_errors = 0;
        self.max_consecutive_hits = self.max_consecutive_hits.max(self.consecutive_hits);
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.consecutive_hits = 0;
        self.consecutive_errors += 1;
    }

    pub fn advance(&mut self) {
        if self.current_index < self.questions.len() {
            self.current_index += 1;
        }
    }
}
