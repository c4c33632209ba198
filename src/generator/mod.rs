pub mod arithmetic;
pub mod decoys;
pub mod sequence;

pub use arithmetic::generate;
pub use decoys::generate_decoys;
pub use sequence::generate_sequence;

/// A single quiz prompt. `text` doubles as its identity within a round and
/// in the persisted error log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub correct_answer: u32,
}

impl Question {
    pub fn new(text: String, correct_answer: u32) -> Self {
        Self {
            text,
            correct_answer,
        }
    }
}
