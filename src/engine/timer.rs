use std::time::Duration;

/// Remaining time at which the audible near-expiry alert fires.
pub const NEAR_EXPIRY: Duration = Duration::from_secs(5);
/// Remaining time at which the accessibility alert (sound + banner) fires.
pub const ACCESSIBILITY_ALERT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Expired,
    /// Study mode, error training, or no active round: full bar, no ticks.
    Unlimited,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorZone {
    Safe,
    Caution,
    Danger,
}

impl ColorZone {
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction <= 0.2 {
            ColorZone::Danger
        } else if fraction <= 0.5 {
            ColorZone::Caution
        } else {
            ColorZone::Safe
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAlert {
    NearExpiry,
    Accessibility,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimerView {
    pub fraction: f64,
    pub zone: ColorZone,
    pub remaining: Duration,
    /// False right after a jump (time extension) that should be drawn
    /// without an animated transition.
    pub smooth: bool,
    pub unlimited: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub view: TimerView,
    pub alerts: Vec<TimerAlert>,
    pub expired: bool,
}

/// Countdown for a single question. Time is kept in whole milliseconds so
/// repeated ticks never drift past a threshold or past zero.
pub struct Countdown {
    state: TimerState,
    limit_ms: u64,
    remaining_ms: u64,
    tick_ms: u64,
    smooth: bool,
}

impl Countdown {
    pub fn new(tick: Duration) -> Self {
        Self {
            state: TimerState::Unlimited,
            limit_ms: 0,
            remaining_ms: 0,
            tick_ms: (tick.as_millis() as u64).max(1),
            smooth: true,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn limit(&self) -> Duration {
        Duration::from_millis(self.limit_ms)
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_millis(self.remaining_ms)
    }

    pub fn fraction(&self) -> f64 {
        match self.state {
            TimerState::Unlimited => 1.0,
            _ if self.limit_ms == 0 => 0.0,
            _ => self.remaining_ms as f64 / self.limit_ms as f64,
        }
    }

    pub fn view(&self) -> TimerView {
        let fraction = self.fraction();
        TimerView {
            fraction,
            zone: ColorZone::from_fraction(fraction),
            remaining: self.remaining(),
            smooth: self.smooth,
            unlimited: self.state == TimerState::Unlimited,
        }
    }

    /// Idle/any → Running with a full bar.
    pub fn start(&mut self, limit: Duration) {
        self.limit_ms = limit.as_millis() as u64;
        self.remaining_ms = self.limit_ms;
        self.smooth = true;
        self.state = if self.limit_ms == 0 {
            TimerState::Expired
        } else {
            TimerState::Running
        };
    }

    pub fn set_unlimited(&mut self) {
        self.state = TimerState::Unlimited;
        self.remaining_ms = self.limit_ms;
        self.smooth = true;
    }

    /// Freeze the countdown where it is. The remaining fraction stays
    /// readable for scoring.
    pub fn halt(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Idle;
        }
    }

    /// One tick: update the bar, check alert crossings, derive the colour
    /// zone. Returns None when the countdown is not running.
    pub fn tick(&mut self, accessibility_active: bool) -> Option<TickReport> {
        if self.state != TimerState::Running {
            return None;
        }
        let previous = self.remaining_ms;
        self.remaining_ms = self.remaining_ms.saturating_sub(self.tick_ms);
        self.smooth = true;

        if self.remaining_ms == 0 {
            self.state = TimerState::Expired;
            return Some(TickReport {
                view: self.view(),
                alerts: Vec::new(),
                expired: true,
            });
        }

        let mut alerts = Vec::new();
        if crossed(previous, self.remaining_ms, NEAR_EXPIRY) {
            alerts.push(TimerAlert::NearExpiry);
        }
        if accessibility_active && crossed(previous, self.remaining_ms, ACCESSIBILITY_ALERT) {
            alerts.push(TimerAlert::Accessibility);
        }

        Some(TickReport {
            view: self.view(),
            alerts,
            expired: false,
        })
    }

    /// Add `delta`, capped at the limit. Only meaningful while running.
    pub fn extend(&mut self, delta: Duration) -> Option<TimerView> {
        if self.state != TimerState::Running {
            return None;
        }
        let delta_ms = delta.as_millis() as u64;
        self.remaining_ms = (self.remaining_ms + delta_ms).min(self.limit_ms);
        self.smooth = false;
        Some(self.view())
    }
}

fn crossed(previous_ms: u64, current_ms: u64, threshold: Duration) -> bool {
    let t = threshold.as_millis() as u64;
    previous_ms > t && current_ms <= t
}
