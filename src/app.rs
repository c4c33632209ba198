use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::Config;
use crate::engine::accessibility::SharedSignal;
use crate::engine::timer::{TimerAlert, TimerView};
use crate::error::GameError;
use crate::session::controller::RoundController;
use crate::session::events::GameEvent;
use crate::session::result::RoundStats;
use crate::session::round::{GameMode, Level, Operation};
use crate::store::KeyValueStore;
use crate::ui::components::answer_grid::Highlights;
use crate::ui::components::menu::Menu;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Home,
    LevelSelect,
    Game,
    RoundResult,
    Ranking,
    Mistakes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub options: [u32; 4],
}

/// Terminal front end over a `RoundController`. Keys become controller
/// calls; drained events become the view state read by the renderer.
pub struct App {
    pub screen: AppScreen,
    pub menu: Menu<'static>,
    pub level_menu: Menu<'static>,
    pub theme: &'static Theme,
    pub controller: RoundController,
    pub sign_language: SharedSignal,
    pub selected_operation: Operation,
    pub selected_level: Level,
    pub question: Option<QuestionView>,
    pub highlights: Highlights,
    pub timer: TimerView,
    pub round_stats: Option<RoundStats>,
    pub spoken: Option<String>,
    pub alert: Option<TimerAlert>,
    pub celebrating: bool,
    pub should_quit: bool,
    bell: bool,
}

impl App {
    pub fn new(config: Config, store: Box<dyn KeyValueStore>, seed: Option<u64>) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));

        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let sign_language = SharedSignal::default();
        let controller =
            RoundController::new(config, store, Box::new(sign_language.clone()), rng);
        let timer = controller.timer_view();

        Self {
            screen: AppScreen::Home,
            menu: Menu::home(theme),
            level_menu: Menu::levels(Operation::Addition, theme),
            theme,
            controller,
            sign_language,
            selected_operation: Operation::Addition,
            selected_level: Level::Easy,
            question: None,
            highlights: Highlights::default(),
            timer,
            round_stats: None,
            spoken: None,
            alert: None,
            celebrating: false,
            should_quit: false,
            bell: false,
        }
    }

    /// Move the game clock to `now` and fold the resulting events into the
    /// view.
    pub fn advance(&mut self, now: Duration) {
        self.controller.advance_to(now);
        self.apply_events();
    }

    /// True once per audible cue (timer alert or rejected action).
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    fn apply_events(&mut self) {
        for event in self.controller.drain_events() {
            match event {
                GameEvent::QuestionLoaded {
                    index,
                    total,
                    text,
                    options,
                } => {
                    self.question = Some(QuestionView {
                        index,
                        total,
                        text,
                        options,
                    });
                    self.highlights = Highlights::default();
                    self.alert = None;
                    self.celebrating = false;
                    self.spoken = None;
                }
                GameEvent::TimerTick(view) => self.timer = view,
                GameEvent::TimerAlert(alert) => {
                    self.alert = Some(alert);
                    self.bell = true;
                }
                GameEvent::AnswerResolved {
                    correct_index,
                    chosen_index,
                    ..
                } => {
                    self.highlights = Highlights {
                        chosen: chosen_index,
                        correct: correct_index,
                    };
                }
                GameEvent::AnswerRevealed { correct_index } => {
                    self.highlights = Highlights {
                        chosen: None,
                        correct: correct_index,
                    };
                }
                GameEvent::OptionsReset => {
                    self.highlights = Highlights::default();
                    self.alert = None;
                }
                GameEvent::Celebrate => self.celebrating = true,
                GameEvent::ReadAloud(text) => self.spoken = Some(text),
                GameEvent::Notice(_) => {}
                GameEvent::ActionRejected { .. } => self.bell = true,
                GameEvent::RoundComplete(stats) => {
                    self.round_stats = Some(stats);
                    self.screen = AppScreen::RoundResult;
                }
                GameEvent::TrainingComplete => {
                    self.question = None;
                    self.screen = AppScreen::Mistakes;
                }
            }
        }
    }

    // --- Navigation ---

    pub fn go_to_home(&mut self) {
        self.controller.quit_round();
        self.apply_events();
        self.question = None;
        self.screen = AppScreen::Home;
    }

    pub fn choose_operation(&mut self, operation: Operation) {
        self.selected_operation = operation;
        self.level_menu = Menu::levels(operation, self.theme);
        self.screen = AppScreen::LevelSelect;
    }

    pub fn go_to_ranking(&mut self) {
        self.screen = AppScreen::Ranking;
    }

    pub fn go_to_mistakes(&mut self) {
        self.screen = AppScreen::Mistakes;
    }

    // --- Intents ---

    pub fn start_round(&mut self, level: Level) {
        self.selected_level = level;
        match self.controller.start_round(self.selected_operation, level) {
            Ok(()) => {
                self.round_stats = None;
                self.screen = AppScreen::Game;
            }
            Err(e) => tracing::warn!(error = %e, "round not started"),
        }
        self.apply_events();
    }

    pub fn retry_round(&mut self) {
        self.start_round(self.selected_level);
    }

    pub fn start_training(&mut self) {
        if self.controller.start_error_training().is_ok() {
            self.screen = AppScreen::Game;
        }
        self.apply_events();
    }

    pub fn answer(&mut self, option_index: usize) {
        self.intent(|c| c.submit_answer(option_index).map(|_| ()));
    }

    pub fn extend_time(&mut self) {
        self.intent(RoundController::extend_time);
    }

    pub fn reveal_answer(&mut self) {
        self.intent(RoundController::reveal_answer);
    }

    pub fn toggle_mode(&mut self) {
        self.intent(|c| c.toggle_mode().map(|_| ()));
    }

    pub fn toggle_voice_readout(&mut self) {
        self.controller.toggle_voice_readout();
        self.apply_events();
    }

    /// Flip the external sign-language widget signal. Takes effect at the
    /// next timer start or cost computation.
    pub fn toggle_sign_language(&mut self) {
        let on = self.sign_language.toggle();
        tracing::info!(on, "sign-language widget toggled");
    }

    pub fn clear_error_log(&mut self) {
        self.controller.clear_error_log();
        self.apply_events();
    }

    pub fn clear_high_scores(&mut self) {
        self.controller.clear_high_scores();
        self.apply_events();
    }

    /// Run a controller intent. Rejections already produced their own
    /// notice; invalid transitions (late keys) are dropped quietly.
    fn intent<F>(&mut self, f: F)
    where
        F: FnOnce(&mut RoundController) -> Result<(), GameError>,
    {
        if let Err(e) = f(&mut self.controller) {
            match e {
                GameError::InvalidTransition { .. } => tracing::trace!(error = %e, "input ignored"),
                _ => tracing::debug!(error = %e, "intent rejected"),
            }
        }
        self.apply_events();
    }

    /// Copy the toggles the player changed in-game onto `config`, so the
    /// next launch starts the same way.
    pub fn write_preferences(&self, config: &mut Config) {
        config.start_in_study_mode = self.controller.preferred_mode() == GameMode::Study;
        config.voice_readout = self.controller.voice_readout();
    }

    pub fn mode_label(&self) -> &'static str {
        match self.controller.mode() {
            GameMode::ErrorTraining => GameMode::ErrorTraining.label(),
            _ => self.controller.preferred_mode().label(),
        }
    }
}
