use std::time::Duration;

use chrono::Utc;
use rand::rngs::SmallRng;

use crate::config::Config;
use crate::engine::accessibility::{Accessibility, AccessibilitySignal};
use crate::engine::economy::{ActionCosts, try_spend};
use crate::engine::scheduler::{Scheduler, TaskId};
use crate::engine::scoring::compute_points;
use crate::engine::timer::{Countdown, TimerAlert, TimerView};
use crate::error::{Action, GameError};
use crate::generator::arithmetic::{from_superscript, root_index};
use crate::generator::{Question, generate_decoys, generate_sequence};
use crate::session::events::{GameEvent, Notice, Severity};
use crate::session::result::RoundStats;
use crate::session::round::{GameMode, Level, Operation, RoundPhase, RoundState};
use crate::store::KeyValueStore;
use crate::store::schema::{ErrorRecord, PlayerProfile, Submitted};

const ENCOURAGE_AFTER_ERRORS: u32 = 3;

const NOTICE_SUCCESS_MS: u64 = 2000;
const NOTICE_INFO_MS: u64 = 3000;
const NOTICE_WARNING_MS: u64 = 4000;
const NOTICE_INCENTIVE_MS: u64 = 2500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Task {
    Tick,
    Advance,
    TrainingRetry,
    NoticeExpiry,
}

/// Owns one player's game: the round in progress, the persisted profile and
/// every pending timer. All time flows through `advance_to`, so the same
/// inputs at the same virtual instants always produce the same events.
pub struct RoundController {
    config: Config,
    costs: ActionCosts,
    state: RoundState,
    profile: PlayerProfile,
    store: Box<dyn KeyValueStore>,
    countdown: Countdown,
    scheduler: Scheduler<Task>,
    tick_task: Option<TaskId>,
    notice: Option<Notice>,
    notice_task: Option<TaskId>,
    accessibility: Accessibility,
    rng: SmallRng,
    preferred_mode: GameMode,
    events: Vec<GameEvent>,
    last_stats: Option<RoundStats>,
}

impl RoundController {
    pub fn new(
        config: Config,
        store: Box<dyn KeyValueStore>,
        signal: Box<dyn AccessibilitySignal>,
        rng: SmallRng,
    ) -> Self {
        let profile = PlayerProfile::load(store.as_ref());
        let preferred_mode = if config.start_in_study_mode {
            GameMode::Study
        } else {
            GameMode::Rapid
        };
        tracing::info!(
            xp = profile.xp,
            saved_errors = profile.error_log.len(),
            "player profile loaded"
        );
        Self {
            costs: ActionCosts::from_config(&config),
            state: RoundState::new(Operation::Addition, Level::Easy, preferred_mode),
            profile,
            store,
            countdown: Countdown::new(config.tick()),
            scheduler: Scheduler::new(),
            tick_task: None,
            notice: None,
            notice_task: None,
            accessibility: Accessibility::new(signal, config.voice_readout),
            rng,
            preferred_mode,
            events: Vec::new(),
            last_stats: None,
            config,
        }
    }

    // --- Accessors ---

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    pub fn mode(&self) -> GameMode {
        self.state.mode
    }

    pub fn preferred_mode(&self) -> GameMode {
        self.preferred_mode
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn xp(&self) -> u32 {
        self.profile.xp
    }

    pub fn costs(&self) -> &ActionCosts {
        &self.costs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn timer_view(&self) -> TimerView {
        self.countdown.view()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn accessibility_active(&self) -> bool {
        self.accessibility.is_active()
    }

    pub fn voice_readout(&self) -> bool {
        self.accessibility.voice_readout()
    }

    pub fn last_stats(&self) -> Option<&RoundStats> {
        self.last_stats.as_ref()
    }

    /// Current position of the virtual clock.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.state.phase,
            RoundPhase::Answering | RoundPhase::Resolving
        )
    }

    pub fn ranking(&self) -> Vec<(Operation, u64)> {
        self.profile.high_scores.ranking()
    }

    pub fn recent_errors(&self, n: usize) -> Vec<&ErrorRecord> {
        self.profile.error_log.recent(n)
    }

    pub fn has_saved_errors(&self) -> bool {
        !self.profile.error_log.is_empty()
    }

    /// Events queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Clock ---

    /// Run every task due at or before `now`, one at a time and in deadline
    /// order, then move the clock to `now`.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some(task) = self.scheduler.pop_due(now) {
            match task {
                Task::Tick => self.on_tick(),
                Task::Advance => self.on_advance(),
                Task::TrainingRetry => self.on_training_retry(),
                Task::NoticeExpiry => {
                    self.notice = None;
                    self.notice_task = None;
                }
            }
        }
        self.scheduler.settle(now);
    }

    // --- Round lifecycle ---

    pub fn start_round(&mut self, operation: Operation, level: Level) -> Result<(), GameError> {
        let requested = self.config.question_count;
        let questions = generate_sequence(operation, level, requested, &mut self.rng);
        if questions.is_empty() {
            return Err(GameError::GenerationExhausted {
                requested,
                produced: 0,
            });
        }

        self.cancel_round_tasks();
        self.last_stats = None;
        self.state
            .begin(operation, level, self.preferred_mode, questions);
        tracing::info!(
            operation = operation.as_str(),
            level = level.as_str(),
            mode = self.preferred_mode.as_str(),
            questions = self.state.total(),
            "round started"
        );
        self.load_question();
        Ok(())
    }

    /// Replay the saved mistakes as a round of their own. Answers neither
    /// score nor earn XP; a correct one clears a single log entry.
    pub fn start_error_training(&mut self) -> Result<(), GameError> {
        if self.profile.error_log.is_empty() {
            self.notify("No saved mistakes to practice. Nice work!", Severity::Info);
            return Err(GameError::NothingToTrain);
        }
        let questions: Vec<Question> = self
            .profile
            .error_log
            .records()
            .iter()
            .map(|r| Question::new(r.question.clone(), r.correct_answer))
            .collect();

        self.cancel_round_tasks();
        self.last_stats = None;
        let (operation, level) = (self.state.operation, self.state.level);
        self.state
            .begin(operation, level, GameMode::ErrorTraining, questions);
        tracing::info!(questions = self.state.total(), "error training started");
        self.load_question();
        Ok(())
    }

    /// Abandon the round. Pending ticks and advances are dropped; a visible
    /// notice is left to expire on its own.
    pub fn quit_round(&mut self) {
        if self.state.phase == RoundPhase::NotStarted {
            return;
        }
        self.cancel_round_tasks();
        self.countdown.set_unlimited();
        if self.state.mode == GameMode::ErrorTraining {
            self.state.mode = self.preferred_mode;
        }
        tracing::info!(
            index = self.state.current_index,
            total = self.state.total(),
            "round abandoned"
        );
        self.state.phase = RoundPhase::NotStarted;
    }

    fn load_question(&mut self) {
        if self.state.is_finished() {
            self.finish_round();
            return;
        }
        let Some(question) = self.state.current_question().cloned() else {
            return;
        };

        self.state.options = generate_decoys(question.correct_answer, &mut self.rng);
        self.state.current_correct_answer = Some(question.correct_answer);
        self.state.phase = RoundPhase::Answering;

        self.events.push(GameEvent::QuestionLoaded {
            index: self.state.current_index,
            total: self.state.total(),
            text: question.text.clone(),
            options: self.state.options,
        });
        if self.accessibility.voice_readout() {
            self.events.push(GameEvent::ReadAloud(spoken(&question.text)));
        }

        if self.state.mode.is_timed() {
            self.restart_countdown();
        } else {
            self.show_unlimited_timer();
        }
    }

    fn on_advance(&mut self) {
        if self.state.phase != RoundPhase::Resolving {
            return;
        }
        self.state.advance();
        self.load_question();
    }

    fn finish_round(&mut self) {
        self.cancel_tick();
        self.countdown.set_unlimited();
        self.state.phase = RoundPhase::Complete;
        self.state.current_correct_answer = None;

        if self.state.mode == GameMode::ErrorTraining {
            tracing::info!(remaining = self.profile.error_log.len(), "error training complete");
            self.events.push(GameEvent::TrainingComplete);
            self.events.push(GameEvent::Celebrate);
            self.notify(
                "Training complete! Every mistake was answered.",
                Severity::Success,
            );
            return;
        }

        let operation = self.state.operation;
        let previous_best = self.profile.high_scores.best(operation);
        let new_record = self.profile.high_scores.record(operation, self.state.score);
        if new_record {
            self.profile.flush_high_scores(self.store.as_ref());
        }

        let stats = RoundStats::from_round(
            &self.state,
            self.profile.xp,
            previous_best,
            new_record,
            self.has_saved_errors(),
        );
        tracing::info!(
            operation = operation.as_str(),
            score = stats.score,
            hits = stats.hits,
            misses = stats.misses,
            new_record,
            "round complete"
        );
        if new_record {
            self.events.push(GameEvent::Celebrate);
        }
        self.events.push(GameEvent::RoundComplete(stats.clone()));
        self.last_stats = Some(stats);
    }

    // --- Answers ---

    /// Answer with one of the four on-screen options. Returns whether it
    /// was correct.
    pub fn submit_answer(&mut self, option_index: usize) -> Result<bool, GameError> {
        self.ensure_answering(Action::Answer)?;
        let value = *self
            .state
            .options
            .get(option_index)
            .ok_or(GameError::Unavailable {
                action: Action::Answer,
            })?;
        Ok(self.resolve(Submitted::Value(value), Some(option_index)))
    }

    /// Answer with a raw number instead of an option slot, for front ends
    /// that take typed input. A value matching one of the options
    /// highlights that slot.
    pub fn submit_value(&mut self, value: u32) -> Result<bool, GameError> {
        self.ensure_answering(Action::Answer)?;
        let chosen = self.state.options.iter().position(|&o| o == value);
        Ok(self.resolve(Submitted::Value(value), chosen))
    }

    /// Resolve the current question as if time ran out.
    pub fn submit_timeout(&mut self) -> Result<(), GameError> {
        self.ensure_answering(Action::Answer)?;
        self.resolve(Submitted::Timeout, None);
        Ok(())
    }

    fn ensure_answering(&self, action: Action) -> Result<(), GameError> {
        if self.state.phase == RoundPhase::Answering {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                action,
                phase: self.state.phase,
            })
        }
    }

    fn resolve(&mut self, submitted: Submitted, chosen_index: Option<usize>) -> bool {
        let Some(answer) = self.state.current_correct_answer else {
            return false;
        };
        let Some(question) = self.state.current_question().cloned() else {
            return false;
        };
        let correct = submitted == Submitted::Value(answer);
        let remaining_fraction = self.countdown.fraction();
        self.cancel_tick();
        self.countdown.halt();
        self.state.phase = RoundPhase::Resolving;

        tracing::debug!(
            question = %question.text,
            submitted = %submitted,
            correct,
            "answer resolved"
        );

        if self.state.mode == GameMode::ErrorTraining {
            self.resolve_training(&question, correct, chosen_index);
            return correct;
        }

        let correct_index = self.state.correct_option_index();
        if correct {
            self.state.record_hit();
            let mut awarded = 0;
            if self.state.mode.is_timed() {
                let points = compute_points(
                    self.state.level,
                    remaining_fraction,
                    self.state.consecutive_hits,
                );
                awarded = points.total;
                self.state.score += u64::from(points.total);
                if points.combo_bonus > 0 {
                    self.notify(
                        format!(
                            "COMBO x{}! +{} bonus",
                            self.state.consecutive_hits, points.combo_bonus
                        ),
                        Severity::Incentive,
                    );
                }
            }
            self.gain_xp(self.costs.xp_per_hit);
            self.events.push(GameEvent::AnswerResolved {
                correct: true,
                correct_index,
                chosen_index,
                points: awarded,
            });
            self.events.push(GameEvent::Celebrate);
            self.schedule(self.config.correct_delay_ms, Task::Advance);
        } else {
            self.state.record_miss();
            self.profile.error_log.push(ErrorRecord {
                question: question.text.clone(),
                correct_answer: answer,
                submitted,
                timestamp: Utc::now(),
            });
            self.profile.flush_error_log(self.store.as_ref());
            self.events.push(GameEvent::AnswerResolved {
                correct: false,
                correct_index,
                chosen_index,
                points: 0,
            });
            if submitted == Submitted::Timeout {
                self.notify(format!("Time's up! The answer was {answer}."), Severity::Warning);
            }
            self.encourage_after_miss();
            self.schedule(self.config.wrong_delay_ms, Task::Advance);
        }
        correct
    }

    fn resolve_training(&mut self, question: &Question, correct: bool, chosen_index: Option<usize>) {
        let correct_index = self.state.correct_option_index();
        if correct {
            self.state.record_hit();
            if self.profile.error_log.remove_first(&question.text) {
                self.profile.flush_error_log(self.store.as_ref());
            }
            self.events.push(GameEvent::AnswerResolved {
                correct: true,
                correct_index,
                chosen_index,
                points: 0,
            });
            self.events.push(GameEvent::Celebrate);
            self.schedule(self.config.correct_delay_ms, Task::Advance);
        } else {
            self.state.record_miss();
            self.events.push(GameEvent::AnswerResolved {
                correct: false,
                correct_index,
                chosen_index,
                points: 0,
            });
            self.notify(
                format!("Not quite. The answer is {}. Try it again.", question.correct_answer),
                Severity::Info,
            );
            self.schedule(self.config.wrong_delay_ms, Task::TrainingRetry);
        }
    }

    fn on_training_retry(&mut self) {
        if self.state.phase != RoundPhase::Resolving || self.state.mode != GameMode::ErrorTraining {
            return;
        }
        self.state.phase = RoundPhase::Answering;
        self.events.push(GameEvent::OptionsReset);
        self.show_unlimited_timer();
    }

    fn encourage_after_miss(&mut self) {
        if self.state.consecutive_errors == ENCOURAGE_AFTER_ERRORS
            && self.state.mode == GameMode::Rapid
        {
            self.notify(
                "Three misses in a row. Study mode (m) takes the clock away while you practice.",
                Severity::Warning,
            );
        }
    }

    fn gain_xp(&mut self, amount: u32) {
        self.profile.xp = self.profile.xp.saturating_add(amount);
        self.state.xp_gained = self.state.xp_gained.saturating_add(amount);
        self.profile.flush_xp(self.store.as_ref());
    }

    // --- XP actions ---

    /// Buy extra seconds on the running countdown.
    pub fn extend_time(&mut self) -> Result<(), GameError> {
        self.ensure_xp_action(Action::ExtendTime)?;
        let offer = self.costs.extend_offer(self.accessibility.is_active());
        self.spend(Action::ExtendTime, offer.cost)?;

        if let Some(view) = self.countdown.extend(offer.amount) {
            self.events.push(GameEvent::TimerTick(view));
        }
        self.rearm_countdown();
        tracing::info!(cost = offer.cost, secs = offer.amount.as_secs(), "time extended");
        self.notify(
            format!("+{}s for {} XP", offer.amount.as_secs(), offer.cost),
            Severity::Success,
        );
        Ok(())
    }

    /// Buy the answer. Counts as a miss but is not logged as a mistake.
    pub fn reveal_answer(&mut self) -> Result<(), GameError> {
        self.ensure_xp_action(Action::RevealAnswer)?;
        let cost = self.costs.reveal_cost;
        self.spend(Action::RevealAnswer, cost)?;

        self.cancel_tick();
        self.countdown.halt();
        self.state.phase = RoundPhase::Resolving;
        self.state.record_miss();
        let correct_index = self.state.correct_option_index();
        self.events.push(GameEvent::AnswerRevealed { correct_index });
        if let Some(answer) = self.state.current_correct_answer {
            self.notify(format!("The answer is {answer}."), Severity::Info);
        }
        tracing::info!(cost, "answer revealed");
        self.encourage_after_miss();
        self.schedule(self.config.reveal_delay_ms, Task::Advance);
        Ok(())
    }

    fn ensure_xp_action(&mut self, action: Action) -> Result<(), GameError> {
        self.ensure_answering(action)?;
        if !self.state.mode.is_timed() || !self.countdown.is_running() {
            tracing::warn!(action = action.as_str(), mode = self.state.mode.as_str(), "action unavailable");
            self.notify(
                format!("{} is only available in rapid mode.", capitalized(action.as_str())),
                Severity::Warning,
            );
            return Err(GameError::Unavailable { action });
        }
        Ok(())
    }

    fn spend(&mut self, action: Action, cost: u32) -> Result<(), GameError> {
        let balance = self.profile.xp;
        if !try_spend(&mut self.profile.xp, cost) {
            tracing::warn!(action = action.as_str(), cost, balance, "not enough XP");
            self.events.push(GameEvent::ActionRejected { action, cost });
            self.notify(
                format!("Not enough XP: {action} costs {cost}, you have {balance}."),
                Severity::Warning,
            );
            return Err(GameError::InsufficientXp {
                action,
                cost,
                balance,
            });
        }
        self.profile.flush_xp(self.store.as_ref());
        Ok(())
    }

    // --- Modes and toggles ---

    /// Switch between rapid and study. The live question follows at once:
    /// rapid restarts a full countdown, study drops the clock.
    pub fn set_mode(&mut self, mode: GameMode) -> Result<(), GameError> {
        if mode == GameMode::ErrorTraining
            || (self.state.mode == GameMode::ErrorTraining && self.is_active())
        {
            return Err(GameError::Unavailable {
                action: Action::ToggleMode,
            });
        }
        self.preferred_mode = mode;

        if self.is_active() && self.state.mode != mode {
            self.state.mode = mode;
            if self.state.phase == RoundPhase::Answering {
                if mode.is_timed() {
                    self.restart_countdown();
                } else {
                    self.show_unlimited_timer();
                }
            }
        }
        tracing::info!(mode = mode.as_str(), "mode changed");
        self.notify(format!("{} mode", mode.label()), Severity::Info);
        Ok(())
    }

    pub fn toggle_mode(&mut self) -> Result<GameMode, GameError> {
        let next = match self.preferred_mode {
            GameMode::Rapid => GameMode::Study,
            _ => GameMode::Rapid,
        };
        self.set_mode(next)?;
        Ok(next)
    }

    /// Flip spoken questions on or off. Turning it on reads the current
    /// question straight away.
    pub fn toggle_voice_readout(&mut self) -> bool {
        let on = !self.accessibility.voice_readout();
        self.accessibility.set_voice_readout(on);
        if on
            && self.state.phase == RoundPhase::Answering
            && let Some(q) = self.state.current_question()
        {
            self.events.push(GameEvent::ReadAloud(spoken(&q.text)));
        }
        let text = if on {
            "Voice readout on"
        } else {
            "Voice readout off"
        };
        self.notify(text, Severity::Info);
        on
    }

    pub fn clear_error_log(&mut self) {
        self.profile.error_log.clear();
        self.profile.flush_error_log(self.store.as_ref());
        self.notify("Saved mistakes cleared.", Severity::Info);
    }

    pub fn clear_high_scores(&mut self) {
        self.profile.high_scores.clear();
        self.profile.flush_high_scores(self.store.as_ref());
        self.notify("Ranking cleared.", Severity::Info);
    }

    // --- Timer plumbing ---

    fn time_limit(&self) -> Duration {
        let base = self.config.time_limit(self.state.level);
        if self.accessibility.is_active() {
            base * 2
        } else {
            base
        }
    }

    fn restart_countdown(&mut self) {
        let limit = self.time_limit();
        self.countdown.start(limit);
        self.events.push(GameEvent::TimerTick(self.countdown.view()));
        self.rearm_countdown();
    }

    /// Drop any pending tick and schedule exactly one new tick if the
    /// countdown is running.
    fn rearm_countdown(&mut self) {
        self.cancel_tick();
        if self.countdown.is_running() {
            let interval = self.countdown.tick_interval();
            self.tick_task = Some(self.scheduler.schedule_in(interval, Task::Tick));
        }
    }

    fn cancel_tick(&mut self) {
        if let Some(id) = self.tick_task.take() {
            self.scheduler.cancel(id);
        }
    }

    fn show_unlimited_timer(&mut self) {
        self.cancel_tick();
        self.countdown.set_unlimited();
        self.events.push(GameEvent::TimerTick(self.countdown.view()));
    }

    fn on_tick(&mut self) {
        self.tick_task = None;
        let Some(report) = self.countdown.tick(self.accessibility.is_active()) else {
            return;
        };
        tracing::trace!(remaining_ms = report.view.remaining.as_millis() as u64, "tick");
        self.events.push(GameEvent::TimerTick(report.view));
        for alert in &report.alerts {
            self.events.push(GameEvent::TimerAlert(*alert));
            if *alert == TimerAlert::Accessibility {
                self.notify("10 seconds left!", Severity::Warning);
            }
        }

        if report.expired {
            tracing::debug!("countdown expired");
            if self.submit_timeout().is_err() {
                tracing::warn!(phase = self.state.phase.as_str(), "expiry outside answering");
            }
        } else {
            self.rearm_countdown();
        }
    }

    // --- Scheduling helpers ---

    fn schedule(&mut self, delay_ms: u64, task: Task) -> TaskId {
        self.scheduler
            .schedule_in(Duration::from_millis(delay_ms), task)
    }

    fn cancel_round_tasks(&mut self) {
        self.scheduler
            .cancel_where(|t| !matches!(t, Task::NoticeExpiry));
        self.tick_task = None;
    }

    fn notify(&mut self, text: impl Into<String>, severity: Severity) {
        let duration_ms = match severity {
            Severity::Success => NOTICE_SUCCESS_MS,
            Severity::Info => NOTICE_INFO_MS,
            Severity::Warning => NOTICE_WARNING_MS,
            Severity::Incentive => NOTICE_INCENTIVE_MS,
        };
        let notice = Notice::new(text, severity, duration_ms);
        if let Some(id) = self.notice_task.take() {
            self.scheduler.cancel(id);
        }
        self.notice_task = Some(self.schedule(duration_ms, Task::NoticeExpiry));
        self.events.push(GameEvent::Notice(notice.clone()));
        self.notice = Some(notice);
    }
}

/// Question text as a speech engine should read it.
fn spoken(text: &str) -> String {
    let expr = text.strip_suffix(" = ?").unwrap_or(text);

    let mut chars = expr.chars();
    if let Some(index) = chars.next().and_then(root_index) {
        let name = match index {
            2 => "square root",
            3 => "cube root",
            _ => "fourth root",
        };
        return format!("{name} of {}", chars.as_str());
    }
    if let Some(split) = expr.find(|c: char| !c.is_ascii_digit())
        && let Some(exp) = from_superscript(&expr[split..])
    {
        return format!("{} to the power of {exp}", &expr[..split]);
    }

    expr.replace('+', "plus")
        .replace(" - ", " minus ")
        .replace('×', "times")
        .replace('÷', "divided by")
}

fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::accessibility::SharedSignal;
    use crate::engine::timer::TimerState;
    use crate::store::memory_store::MemoryStore;
    use crate::store::schema::{ERROR_LOG_KEY, ErrorLog, HIGH_SCORES_KEY, XP_KEY};
    use rand::SeedableRng;

    fn make(config: Config, store: &MemoryStore) -> (RoundController, SharedSignal) {
        let signal = SharedSignal::default();
        let controller = RoundController::new(
            config,
            Box::new(store.clone()),
            Box::new(signal.clone()),
            SmallRng::seed_from_u64(7),
        );
        (controller, signal)
    }

    fn short_round(questions: usize) -> Config {
        Config {
            question_count: questions,
            ..Config::default()
        }
    }

    fn wait(c: &mut RoundController, ms: u64) {
        let target = c.now() + Duration::from_millis(ms);
        c.advance_to(target);
    }

    fn correct_index(c: &RoundController) -> usize {
        c.state().correct_option_index().unwrap()
    }

    fn answer_right(c: &mut RoundController) {
        let idx = correct_index(c);
        assert!(c.submit_answer(idx).unwrap());
    }

    fn answer_wrong(c: &mut RoundController) {
        let idx = (correct_index(c) + 1) % 4;
        assert!(!c.submit_answer(idx).unwrap());
    }

    fn logged(c: &RoundController, question: &str) -> usize {
        c.profile()
            .error_log
            .records()
            .iter()
            .filter(|r| r.question == question)
            .count()
    }

    fn with_xp(xp: u32) -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_raw(XP_KEY, &xp.to_string());
        store
    }

    #[test]
    fn test_start_round_loads_first_question() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();

        assert_eq!(c.phase(), RoundPhase::Answering);
        assert_eq!(c.state().total(), 20);
        assert_eq!(c.timer_view().remaining, Duration::from_secs(15));
        let events = c.drain_events();
        assert!(matches!(
            events.first(),
            Some(GameEvent::QuestionLoaded { index: 0, total: 20, .. })
        ));
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn test_start_round_resets_previous_counters() {
        let store = MemoryStore::new();
        let (mut c, _) = make(short_round(5), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        answer_right(&mut c);
        wait(&mut c, 1500);
        answer_wrong(&mut c);

        c.start_round(Operation::Subtraction, Level::Medium).unwrap();
        let s = c.state();
        assert_eq!(s.score, 0);
        assert_eq!(s.hits, 0);
        assert_eq!(s.misses, 0);
        assert_eq!(s.consecutive_hits, 0);
        assert_eq!(s.consecutive_errors, 0);
        assert_eq!(s.xp_gained, 0);
        assert_eq!(s.current_index, 0);
        assert_eq!(c.timer_view().remaining, Duration::from_secs(30));
    }

    #[test]
    fn test_correct_answer_scores_and_persists_xp() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        c.drain_events();

        answer_right(&mut c);
        assert_eq!(c.state().score, 200);
        assert_eq!(c.xp(), 50);
        assert_eq!(store.raw(XP_KEY).as_deref(), Some("50"));
        let events = c.drain_events();
        assert!(events.contains(&GameEvent::Celebrate));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::AnswerResolved { correct: true, points: 200, .. }
        )));

        wait(&mut c, 1499);
        assert_eq!(c.state().current_index, 0);
        wait(&mut c, 1);
        assert_eq!(c.state().current_index, 1);
        assert_eq!(c.phase(), RoundPhase::Answering);
    }

    #[test]
    fn test_time_bonus_shrinks_with_elapsed_time() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Addition, Level::Medium).unwrap();
        // 15 of 30 seconds left: base 150 + bonus 75.
        wait(&mut c, 15_000);
        answer_right(&mut c);
        assert_eq!(c.state().score, 225);
    }

    #[test]
    fn test_wrong_answer_logs_error_and_waits_longer() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Multiplication, Level::Easy).unwrap();
        let text = c.state().current_question().unwrap().text.clone();

        answer_wrong(&mut c);
        assert_eq!(c.state().misses, 1);
        assert_eq!(c.state().score, 0);
        assert_eq!(c.xp(), 0);
        assert_eq!(logged(&c, &text), 1);
        let saved: ErrorLog = serde_json::from_str(&store.raw(ERROR_LOG_KEY).unwrap()).unwrap();
        assert_eq!(saved.len(), 1);

        wait(&mut c, 1500);
        assert_eq!(c.state().current_index, 0);
        wait(&mut c, 1000);
        assert_eq!(c.state().current_index, 1);
    }

    #[test]
    fn test_input_rejected_while_resolving() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        answer_right(&mut c);

        let err = c.submit_answer(0).unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidTransition {
                action: Action::Answer,
                phase: RoundPhase::Resolving
            }
        );
        assert_eq!(c.state().hits, 1);
        assert_eq!(c.state().misses, 0);
    }

    #[test]
    fn test_answer_before_start_is_invalid() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        assert!(matches!(
            c.submit_value(3),
            Err(GameError::InvalidTransition {
                phase: RoundPhase::NotStarted,
                ..
            })
        ));
    }

    #[test]
    fn test_timeout_is_a_wrong_answer() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        let text = c.state().current_question().unwrap().text.clone();

        wait(&mut c, 14_900);
        assert_eq!(c.phase(), RoundPhase::Answering);
        wait(&mut c, 100);
        assert_eq!(c.phase(), RoundPhase::Resolving);
        assert_eq!(c.countdown.state(), TimerState::Expired);
        assert_eq!(c.state().misses, 1);
        assert_eq!(c.state().consecutive_hits, 0);
        let record = &c.profile().error_log.records()[0];
        assert_eq!(record.question, text);
        assert_eq!(record.submitted, Submitted::Timeout);

        // A late click after expiry is ignored.
        assert!(c.submit_answer(0).is_err());
        wait(&mut c, 2500);
        assert_eq!(c.state().current_index, 1);
    }

    #[test]
    fn test_near_expiry_alert_fires_once() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        c.drain_events();
        wait(&mut c, 14_000);
        let alerts: Vec<_> = c
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::TimerAlert(_)))
            .collect();
        assert_eq!(alerts, vec![GameEvent::TimerAlert(TimerAlert::NearExpiry)]);
    }

    #[test]
    fn test_combo_bonus_from_third_hit() {
        let store = MemoryStore::new();
        let (mut c, _) = make(short_round(4), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();

        let mut totals = Vec::new();
        for _ in 0..4 {
            let before = c.state().score;
            answer_right(&mut c);
            totals.push(c.state().score - before);
            wait(&mut c, 1500);
        }
        assert_eq!(totals, vec![200, 200, 350, 400]);
        assert_eq!(c.state().max_consecutive_hits, 4);
    }

    #[test]
    fn test_combo_notice_is_an_incentive() {
        let store = MemoryStore::new();
        let (mut c, _) = make(short_round(3), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        for _ in 0..2 {
            answer_right(&mut c);
            wait(&mut c, 1500);
        }
        c.drain_events();
        answer_right(&mut c);
        let notice = c.notice().unwrap();
        assert_eq!(notice.severity, Severity::Incentive);
        assert!(notice.text.contains("COMBO x3"));
    }

    #[test]
    fn test_reveal_rejected_without_enough_xp() {
        let store = with_xp(80);
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        c.drain_events();

        let err = c.reveal_answer().unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientXp {
                action: Action::RevealAnswer,
                cost: 250,
                balance: 80
            }
        );
        assert_eq!(c.xp(), 80);
        assert_eq!(c.phase(), RoundPhase::Answering);
        assert_eq!(c.state().misses, 0);
        let events = c.drain_events();
        assert!(events.contains(&GameEvent::ActionRejected {
            action: Action::RevealAnswer,
            cost: 250
        }));
        assert_eq!(c.notice().unwrap().severity, Severity::Warning);

        wait(&mut c, 5000);
        assert_eq!(c.state().current_index, 0);
    }

    #[test]
    fn test_reveal_counts_miss_without_logging() {
        let store = with_xp(300);
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Division, Level::Easy).unwrap();
        let idx = correct_index(&c);
        c.drain_events();

        c.reveal_answer().unwrap();
        assert_eq!(c.xp(), 50);
        assert_eq!(store.raw(XP_KEY).as_deref(), Some("50"));
        assert_eq!(c.state().misses, 1);
        assert_eq!(c.state().consecutive_errors, 1);
        assert!(c.profile().error_log.is_empty());
        assert!(c
            .drain_events()
            .contains(&GameEvent::AnswerRevealed {
                correct_index: Some(idx)
            }));

        wait(&mut c, 2999);
        assert_eq!(c.state().current_index, 0);
        wait(&mut c, 1);
        assert_eq!(c.state().current_index, 1);
    }

    #[test]
    fn test_extend_adds_time_and_caps() {
        let store = with_xp(300);
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        wait(&mut c, 6000);
        assert_eq!(c.timer_view().remaining, Duration::from_secs(9));
        let before = c.timer_view().fraction;

        c.extend_time().unwrap();
        assert_eq!(c.xp(), 200);
        let view = c.timer_view();
        assert!((view.fraction - before - 5.0 / 15.0).abs() < 1e-9);
        assert!(!view.smooth);

        c.extend_time().unwrap();
        assert_eq!(c.xp(), 100);
        assert_eq!(c.timer_view().fraction, 1.0);

        // Exactly one tick is pending after two re-arms.
        wait(&mut c, 100);
        assert_eq!(c.timer_view().remaining, Duration::from_millis(14_900));
        assert!(c.timer_view().smooth);
    }

    #[test]
    fn test_extend_rejected_without_xp() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        wait(&mut c, 2000);
        assert!(matches!(
            c.extend_time(),
            Err(GameError::InsufficientXp { cost: 100, balance: 0, .. })
        ));
        assert_eq!(c.timer_view().remaining, Duration::from_secs(13));
    }

    #[test]
    fn test_accessibility_doubles_limit_and_raises_cost() {
        let store = with_xp(300);
        let (mut c, signal) = make(Config::default(), &store);
        signal.set(true);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        assert_eq!(c.timer_view().remaining, Duration::from_secs(30));

        wait(&mut c, 15_000);
        c.extend_time().unwrap();
        assert_eq!(c.xp(), 150);
        assert_eq!(c.timer_view().remaining, Duration::from_secs(25));
    }

    #[test]
    fn test_accessibility_alert_at_ten_seconds() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        c.toggle_voice_readout();
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        c.drain_events();
        wait(&mut c, 20_500);
        let alerts: Vec<_> = c
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::TimerAlert(_)))
            .collect();
        assert_eq!(alerts, vec![GameEvent::TimerAlert(TimerAlert::Accessibility)]);
    }

    #[test]
    fn test_study_mode_has_no_clock_and_no_score() {
        let store = MemoryStore::new();
        let config = Config {
            start_in_study_mode: true,
            ..Config::default()
        };
        let (mut c, _) = make(config, &store);
        c.start_round(Operation::Root, Level::Easy).unwrap();
        assert_eq!(c.mode(), GameMode::Study);
        assert!(c.timer_view().unlimited);

        wait(&mut c, 60_000);
        assert_eq!(c.phase(), RoundPhase::Answering);
        answer_right(&mut c);
        assert_eq!(c.state().score, 0);
        assert_eq!(c.xp(), 50);

        wait(&mut c, 1500);
        answer_wrong(&mut c);
        assert_eq!(c.profile().error_log.len(), 1);
    }

    #[test]
    fn test_xp_actions_unavailable_in_study() {
        let store = with_xp(1000);
        let (mut c, _) = make(Config::default(), &store);
        c.set_mode(GameMode::Study).unwrap();
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        assert_eq!(
            c.extend_time(),
            Err(GameError::Unavailable {
                action: Action::ExtendTime
            })
        );
        assert_eq!(
            c.reveal_answer(),
            Err(GameError::Unavailable {
                action: Action::RevealAnswer
            })
        );
        assert_eq!(c.xp(), 1000);
    }

    #[test]
    fn test_toggle_mode_applies_to_live_question() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        wait(&mut c, 5000);
        assert_eq!(c.timer_view().remaining, Duration::from_secs(10));

        assert_eq!(c.toggle_mode().unwrap(), GameMode::Study);
        assert_eq!(c.mode(), GameMode::Study);
        assert!(c.timer_view().unlimited);
        wait(&mut c, 30_000);
        assert_eq!(c.phase(), RoundPhase::Answering);

        assert_eq!(c.toggle_mode().unwrap(), GameMode::Rapid);
        assert_eq!(c.timer_view().remaining, Duration::from_secs(15));
        wait(&mut c, 15_000);
        assert_eq!(c.phase(), RoundPhase::Resolving);
    }

    #[test]
    fn test_encouragement_after_three_misses() {
        let store = MemoryStore::new();
        let (mut c, _) = make(short_round(5), &store);
        c.start_round(Operation::Subtraction, Level::Easy).unwrap();
        for _ in 0..2 {
            answer_wrong(&mut c);
            wait(&mut c, 2500);
        }
        c.drain_events();
        answer_wrong(&mut c);
        let notice = c.notice().unwrap();
        assert_eq!(notice.severity, Severity::Warning);
        assert!(notice.text.contains("Study mode"));
        assert_eq!(c.state().consecutive_errors, 3);
    }

    #[test]
    fn test_round_completion_records_high_score() {
        let store = MemoryStore::new();
        let (mut c, _) = make(short_round(3), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        for _ in 0..3 {
            answer_right(&mut c);
            wait(&mut c, 1500);
        }
        assert_eq!(c.phase(), RoundPhase::Complete);
        let stats = c.last_stats().unwrap().clone();
        assert_eq!(stats.score, 750);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.best_streak, 3);
        assert_eq!(stats.xp_gained, 150);
        assert_eq!(stats.xp_total, 150);
        assert_eq!(stats.previous_best, 0);
        assert!(stats.new_record);
        assert!(!stats.has_saved_errors);
        assert!(store.raw(HIGH_SCORES_KEY).unwrap().contains("addition"));
        assert!(c
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::RoundComplete(_))));

        // A weaker round keeps the stored best.
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        for _ in 0..3 {
            answer_wrong(&mut c);
            wait(&mut c, 2500);
        }
        let stats = c.last_stats().unwrap();
        assert_eq!(stats.score, 0);
        assert_eq!(stats.previous_best, 750);
        assert!(!stats.new_record);
        assert!(stats.has_saved_errors);
        assert_eq!(c.ranking(), vec![(Operation::Addition, 750)]);
    }

    fn seeded_log(store: &MemoryStore) {
        let mut log = ErrorLog::default();
        for (text, answer) in [("2 + 3 = ?", 5), ("7 - 4 = ?", 3), ("2 + 3 = ?", 5)] {
            log.push(ErrorRecord {
                question: text.to_string(),
                correct_answer: answer,
                submitted: Submitted::Value(answer + 1),
                timestamp: Utc::now(),
            });
        }
        store.insert_raw(ERROR_LOG_KEY, &serde_json::to_string(&log).unwrap());
    }

    #[test]
    fn test_training_wrong_answer_retries_same_question() {
        let store = MemoryStore::new();
        seeded_log(&store);
        let (mut c, _) = make(Config::default(), &store);
        c.start_error_training().unwrap();
        assert_eq!(c.mode(), GameMode::ErrorTraining);
        assert_eq!(c.state().total(), 3);
        assert!(c.timer_view().unlimited);

        answer_wrong(&mut c);
        assert_eq!(c.phase(), RoundPhase::Resolving);
        assert_eq!(c.profile().error_log.len(), 3);
        c.drain_events();

        wait(&mut c, 2500);
        assert_eq!(c.phase(), RoundPhase::Answering);
        assert_eq!(c.state().current_index, 0);
        assert!(c.drain_events().contains(&GameEvent::OptionsReset));
    }

    #[test]
    fn test_training_correct_removes_one_entry() {
        let store = MemoryStore::new();
        seeded_log(&store);
        let (mut c, _) = make(Config::default(), &store);
        c.start_error_training().unwrap();

        answer_right(&mut c);
        assert_eq!(c.profile().error_log.len(), 2);
        assert_eq!(logged(&c, "2 + 3 = ?"), 1);
        let saved: ErrorLog = serde_json::from_str(&store.raw(ERROR_LOG_KEY).unwrap()).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(c.state().score, 0);
        assert_eq!(c.xp(), 0);

        wait(&mut c, 1500);
        answer_right(&mut c);
        wait(&mut c, 1500);
        c.drain_events();
        answer_right(&mut c);
        wait(&mut c, 1500);

        assert!(c.profile().error_log.is_empty());
        assert_eq!(c.phase(), RoundPhase::Complete);
        assert!(c.drain_events().contains(&GameEvent::TrainingComplete));
        assert!(c.last_stats().is_none());
    }

    #[test]
    fn test_training_with_empty_log_is_rejected() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        assert_eq!(c.start_error_training(), Err(GameError::NothingToTrain));
        assert_eq!(c.phase(), RoundPhase::NotStarted);
        assert_eq!(c.notice().unwrap().severity, Severity::Info);
    }

    #[test]
    fn test_quit_cancels_pending_work() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        answer_wrong(&mut c);
        c.quit_round();
        c.drain_events();

        wait(&mut c, 60_000);
        assert_eq!(c.phase(), RoundPhase::NotStarted);
        assert_eq!(c.state().current_index, 0);
        assert!(c.drain_events().is_empty());
        assert!(c.timer_view().unlimited);
    }

    #[test]
    fn test_quit_training_restores_preferred_mode() {
        let store = MemoryStore::new();
        seeded_log(&store);
        let (mut c, _) = make(Config::default(), &store);
        c.set_mode(GameMode::Study).unwrap();
        c.start_error_training().unwrap();
        assert_eq!(
            c.set_mode(GameMode::Rapid),
            Err(GameError::Unavailable {
                action: Action::ToggleMode
            })
        );
        c.quit_round();
        assert_eq!(c.mode(), GameMode::Study);
    }

    #[test]
    fn test_voice_readout_reads_each_question() {
        let store = MemoryStore::new();
        let (mut c, _) = make(short_round(2), &store);
        c.start_round(Operation::Addition, Level::Easy).unwrap();
        c.drain_events();

        assert!(c.toggle_voice_readout());
        assert!(c.accessibility_active());
        let events = c.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::ReadAloud(t) if t.contains("plus"))));

        answer_right(&mut c);
        wait(&mut c, 1500);
        let spoken: Vec<_> = c
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::ReadAloud(_)))
            .collect();
        assert_eq!(spoken.len(), 1);
    }

    #[test]
    fn test_notice_expires() {
        let store = MemoryStore::new();
        let (mut c, _) = make(Config::default(), &store);
        c.clear_error_log();
        assert!(c.notice().is_some());
        wait(&mut c, NOTICE_INFO_MS);
        assert!(c.notice().is_none());
    }

    #[test]
    fn test_same_seed_same_round() {
        let store = MemoryStore::new();
        let (mut a, _) = make(Config::default(), &store);
        let (mut b, _) = make(Config::default(), &store);
        a.start_round(Operation::Exponentiation, Level::Medium).unwrap();
        b.start_round(Operation::Exponentiation, Level::Medium).unwrap();
        assert_eq!(a.state().questions, b.state().questions);
        assert_eq!(a.state().options, b.state().options);
    }

    #[test]
    fn test_clear_high_scores() {
        let store = MemoryStore::new();
        store.insert_raw(HIGH_SCORES_KEY, r#"{"division": 900}"#);
        let (mut c, _) = make(Config::default(), &store);
        assert_eq!(c.ranking(), vec![(Operation::Division, 900)]);
        c.clear_high_scores();
        assert!(c.ranking().is_empty());
        assert_eq!(store.raw(HIGH_SCORES_KEY).as_deref(), Some("{}"));
    }

    #[test]
    fn test_spoken_text() {
        assert_eq!(spoken("12 ÷ 3 = ?"), "12 divided by 3");
        assert_eq!(spoken("7 - 2 = ?"), "7 minus 2");
        assert_eq!(spoken("3 × 4 = ?"), "3 times 4");
        assert_eq!(spoken("5³ = ?"), "5 to the power of 3");
        assert_eq!(spoken("√49 = ?"), "square root of 49");
        assert_eq!(spoken("∛27 = ?"), "cube root of 27");
        assert_eq!(spoken("∜625 = ?"), "fourth root of 625");
    }

    #[test]
    fn test_training_skips_saved_answers_out_of_range() {
        let store = MemoryStore::new();
        let mut log = ErrorLog::default();
        for correct_answer in [u32::MAX, u32::MAX - 3] {
            log.push(ErrorRecord {
                question: format!("{correct_answer} + 0 = ?"),
                correct_answer,
                submitted: Submitted::Timeout,
                timestamp: Utc::now(),
            });
        }
        store.insert_raw(ERROR_LOG_KEY, &serde_json::to_string(&log).unwrap());

        let (mut c, _) = make(Config::default(), &store);
        assert!(!c.has_saved_errors());
        assert_eq!(c.start_error_training(), Err(GameError::NothingToTrain));
        assert_eq!(c.phase(), RoundPhase::NotStarted);
    }
}
