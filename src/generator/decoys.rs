use rand::Rng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

const NEAR_ATTEMPTS: usize = 10;
const MAX_OFFSET: u32 = 5;
const PAD_SPAN: u32 = 10;

/// Four distinct, non-negative answer options, one of which is `correct`,
/// in random order.
///
/// Near misses (±1..5) are tried first; candidates below zero are discarded
/// before insertion so the result can never shrink. Remaining slots are
/// padded from `correct + 6 ..= correct + 15`, or from the mirrored range
/// below `correct` when that would overflow.
pub fn generate_decoys(correct: u32, rng: &mut SmallRng) -> [u32; 4] {
    let mut options: Vec<u32> = Vec::with_capacity(4);
    options.push(correct);

    for _ in 0..NEAR_ATTEMPTS {
        if options.len() == 4 {
            break;
        }
        let offset = rng.gen_range(1..=MAX_OFFSET);
        let candidate = if rng.gen_bool(0.5) {
            correct.checked_add(offset)
        } else {
            correct.checked_sub(offset)
        };
        if let Some(c) = candidate
            && !options.contains(&c)
        {
            options.push(c);
        }
    }

    let pad_up = correct.checked_add(MAX_OFFSET + PAD_SPAN).is_some();
    while options.len() < 4 {
        let step = MAX_OFFSET + 1 + rng.gen_range(0..PAD_SPAN);
        let c = if pad_up { correct + step } else { correct - step };
        if !options.contains(&c) {
            options.push(c);
        }
    }

    options.shuffle(rng);
    [options[0], options[1], options[2], options[3]]
}
