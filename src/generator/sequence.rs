use std::collections::HashSet;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::generator::{Question, arithmetic};
use crate::session::round::{Level, Operation};

const ATTEMPTS_PER_QUESTION: usize = 50;
const MIN_ATTEMPTS: usize = 200;

/// `count` questions with pairwise-distinct text, shuffled.
///
/// Generation is retried until enough unique questions are collected or the
/// attempt budget runs out. On exhaustion the round is shortened rather than
/// repeating a question.
pub fn generate_sequence(
    operation: Operation,
    level: Level,
    count: usize,
    rng: &mut SmallRng,
) -> Vec<Question> {
    unique_sequence(count, rng, |rng| arithmetic::generate(operation, level, rng))
}

pub fn unique_sequence<F>(count: usize, rng: &mut SmallRng, mut make: F) -> Vec<Question>
where
    F: FnMut(&mut SmallRng) -> Question,
{
    let budget = (count * ATTEMPTS_PER_QUESTION).max(MIN_ATTEMPTS);
    let mut seen: HashSet<String> = HashSet::with_capacity(count);
    let mut list: Vec<Question> = Vec::with_capacity(count);

    let mut attempts = 0;
    while list.len() < count && attempts < budget {
        attempts += 1;
        let q = make(rng);
        if seen.insert(q.text.clone()) {
            list.push(q);
        }
    }

    if list.len() < count {
        tracing::warn!(
            requested = count,
            produced = list.len(),
            attempts,
            "question space exhausted, shortening round"
        );
    }

    list.shuffle(rng);
    list
}
