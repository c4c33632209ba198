use rand::Rng;
use rand::rngs::SmallRng;

use crate::generator::Question;
use crate::session::round::{Level, Operation};

/// Generate one question for `operation` at `level`. All arithmetic is
/// integer: divisions are built from divisor × quotient and roots from
/// base^index, so the shown operands always reproduce `correct_answer`.
pub fn generate(operation: Operation, level: Level, rng: &mut SmallRng) -> Question {
    match operation {
        Operation::Addition => addition(level, rng),
        Operation::Subtraction => subtraction(level, rng),
        Operation::Multiplication => multiplication(level, rng),
        Operation::Division => division(level, rng),
        Operation::Exponentiation => exponentiation(level, rng),
        Operation::Root => root(level, rng),
    }
}

fn addition(level: Level, rng: &mut SmallRng) -> Question {
    let (lo, hi) = match level {
        Level::Easy => (1, 20),
        Level::Medium => (20, 100),
        Level::Advanced => (100, 500),
    };
    let a = rng.gen_range(lo..=hi);
    let b = rng.gen_range(lo..=hi);
    Question::new(format!("{a} + {b} = ?"), a + b)
}

fn subtraction(level: Level, rng: &mut SmallRng) -> Question {
    let (lo, hi) = match level {
        Level::Easy => (1, 30),
        Level::Medium => (30, 150),
        Level::Advanced => (150, 700),
    };
    let a = rng.gen_range(lo..=hi);
    // Subtrahend never exceeds the minuend, so the answer stays non-negative.
    let b = rng.gen_range(1..=a);
    Question::new(format!("{a} - {b} = ?"), a - b)
}

fn multiplication(level: Level, rng: &mut SmallRng) -> Question {
    let (lo, hi) = match level {
        Level::Easy => (0, 5),
        Level::Medium => (6, 10),
        Level::Advanced => (11, 20),
    };
    let a = rng.gen_range(lo..=hi);
    let b = rng.gen_range(0..=10);
    Question::new(format!("{a} × {b} = ?"), a * b)
}

fn division(level: Level, rng: &mut SmallRng) -> Question {
    let ((dlo, dhi), (qlo, qhi)) = match level {
        Level::Easy => ((2, 5), (2, 10)),
        Level::Medium => ((6, 10), (2, 15)),
        Level::Advanced => ((11, 20), (5, 25)),
    };
    let divisor = rng.gen_range(dlo..=dhi);
    let quotient = rng.gen_range(qlo..=qhi);
    let dividend = divisor * quotient;
    Question::new(format!("{dividend} ÷ {divisor} = ?"), quotient)
}

fn exponentiation(level: Level, rng: &mut SmallRng) -> Question {
    let ((blo, bhi), (elo, ehi)) = match level {
        Level::Easy => ((2, 12), (2, 3)),
        Level::Medium => ((2, 8), (2, 4)),
        Level::Advanced => ((5, 12), (3, 5)),
    };
    let base: u32 = rng.gen_range(blo..=bhi);
    let exp: u32 = rng.gen_range(elo..=ehi);
    Question::new(format!("{base}{} = ?", superscript(exp)), base.pow(exp))
}

fn root(level: Level, rng: &mut SmallRng) -> Question {
    let ((ilo, ihi), (blo, bhi)) = match level {
        Level::Easy => ((2, 2), (2, 25)),
        Level::Medium => ((2, 3), (10, 20)),
        Level::Advanced => ((3, 4), (5, 15)),
    };
    let index: u32 = rng.gen_range(ilo..=ihi);
    let base: u32 = rng.gen_range(blo..=bhi);
    let radicand = base.pow(index);
    Question::new(format!("{}{radicand} = ?", root_symbol(index)), base)
}

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

pub fn superscript(n: u32) -> String {
    n.to_string()
        .bytes()
        .map(|d| SUPERSCRIPT_DIGITS[usize::from(d - b'0')])
        .collect()
}

/// Inverse of [`superscript`]. None unless every char is a superscript digit.
pub fn from_superscript(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    s.chars().try_fold(0u32, |acc, c| {
        let digit = SUPERSCRIPT_DIGITS.iter().position(|&d| d == c)?;
        acc.checked_mul(10)?.checked_add(digit as u32)
    })
}

pub fn root_symbol(index: u32) -> &'static str {
    match index {
        3 => "∛",
        4 => "∜",
        _ => "√",
    }
}

/// Inverse of [`root_symbol`].
pub fn root_index(symbol: char) -> Option<u32> {
    match symbol {
        '√' => Some(2),
        '∛' => Some(3),
        '∜' => Some(4),
        _ => None,
    }
}
