use crate::session::round::Level;

pub const BASE_POINTS: f64 = 100.0;
pub const COMBO_THRESHOLD: u32 = 3;
pub const COMBO_STEP: u32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Points {
    pub time_bonus: u32,
    pub combo_bonus: u32,
    pub total: u32,
}

/// Speed reward: the larger the share of the time bar left, the bigger the
/// bonus, up to the level's full base value.
pub fn time_bonus(level: Level, remaining_fraction: f64) -> u32 {
    let used = 1.0 - remaining_fraction.clamp(0.0, 1.0);
    let bonus = (BASE_POINTS * level.multiplier() * (1.0 - used)).round();
    bonus.max(0.0) as u32
}

/// Streak reward, linear in the streak length once it reaches the threshold.
pub fn combo_bonus(consecutive_hits: u32) -> u32 {
    if consecutive_hits >= COMBO_THRESHOLD {
        COMBO_STEP * consecutive_hits
    } else {
        0
    }
}

/// Points for a correct rapid-mode answer. `consecutive_hits` already
/// includes the answer being scored.
pub fn compute_points(level: Level, remaining_fraction: f64, consecutive_hits: u32) -> Points {
    let time_bonus = time_bonus(level, remaining_fraction);
    let combo_bonus = combo_bonus(consecutive_hits);
    let total =
        (BASE_POINTS * level.multiplier() + time_bonus as f64 + combo_bonus as f64).round() as u32;
    Points {
        time_bonus,
        combo_bonus,
        total,
    }
}
