use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use matemagica::app::{App, AppScreen};
use matemagica::config::Config;
use matemagica::engine::accessibility::AccessibilitySignal;
use matemagica::engine::timer::TimerAlert;
use matemagica::event::{AppEvent, EventHandler};
use matemagica::session::round::{GameMode, Level, Operation};
use matemagica::store::json_store::JsonStore;
use matemagica::ui::components::answer_grid::AnswerGrid;
use matemagica::ui::components::error_list::ErrorList;
use matemagica::ui::components::notice::NoticeToast;
use matemagica::ui::components::ranking::Ranking;
use matemagica::ui::components::results::RoundResults;
use matemagica::ui::components::time_bar::TimeBar;
use matemagica::ui::layout::{AppLayout, GameLayout, pack_hint_lines};
use matemagica::ui::theme::Theme;

const LOG_FILTER_ENV: &str = "MATEMAGICA_LOG";

#[derive(Parser)]
#[command(name = "matemagica", version, about = "Terminal mental arithmetic trainer")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Start in study mode (no countdown)")]
    study: bool,

    #[arg(short, long, help = "Number of questions per round")]
    questions: Option<usize>,

    #[arg(long, help = "Seed for reproducible question sequences")]
    seed: Option<u64>,

    #[arg(long, help = "Directory for scores, XP and saved mistakes")]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = match cli.data_dir {
        Some(dir) => JsonStore::with_base_dir(dir)?,
        None => JsonStore::new()?,
    };
    init_logging(store.base_dir())?;

    let mut saved_config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "config unreadable, using defaults");
            Config::default()
        }
    };
    let mut config = saved_config.clone();
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(questions) = cli.questions {
        config.question_count = questions;
    }
    if cli.study {
        config.start_in_study_mode = true;
    }
    config.validate();
    if Theme::load(&config.theme).is_none() {
        tracing::warn!(
            theme = %config.theme,
            available = ?Theme::available_themes(),
            "unknown theme, using the default"
        );
    }

    let tick = config.tick();
    let mut app = App::new(config, Box::new(store), cli.seed);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(tick);

    let result = run_app(&mut terminal, &mut app, &events, &mut saved_config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = ?err, "terminal loop failed");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// The terminal belongs to the UI, so logs go to a file next to the saved
/// data. Filter with `MATEMAGICA_LOG` (default `info`).
fn init_logging(data_dir: &Path) -> Result<()> {
    fs::create_dir_all(data_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("matemagica.log"))?;
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(filter)
        .init();
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    saved_config: &mut Config,
) -> Result<()> {
    let started = Instant::now();
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key, saved_config),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }
        app.advance(started.elapsed());

        if app.take_bell() {
            execute!(terminal.backend_mut(), Print('\x07'))?;
        }
        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent, saved_config: &mut Config) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // Accessibility toggles work on every screen.
    match key.code {
        KeyCode::Char('v') => {
            app.toggle_voice_readout();
            return save_preferences(app, saved_config);
        }
        KeyCode::Char('l') => return app.toggle_sign_language(),
        KeyCode::Char('m') => {
            app.toggle_mode();
            return save_preferences(app, saved_config);
        }
        _ => {}
    }

    match app.screen {
        AppScreen::Home => handle_home_key(app, key),
        AppScreen::LevelSelect => handle_level_key(app, key),
        AppScreen::Game => handle_game_key(app, key),
        AppScreen::RoundResult => handle_result_key(app, key),
        AppScreen::Ranking => handle_ranking_key(app, key),
        AppScreen::Mistakes => handle_mistakes_key(app, key),
    }
}

/// Persist in-game toggles without the one-off CLI overrides.
fn save_preferences(app: &App, saved_config: &mut Config) {
    app.write_preferences(saved_config);
    if let Err(e) = saved_config.save() {
        tracing::warn!(error = %e, "could not save preferences");
    }
}

fn handle_home_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char(c @ '1'..='6') => {
            let idx = c as usize - '1' as usize;
            app.choose_operation(Operation::ALL[idx]);
        }
        KeyCode::Char('r') => app.go_to_ranking(),
        KeyCode::Char('e') => app.go_to_mistakes(),
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => match app.menu.selected {
            i if i < Operation::ALL.len() => app.choose_operation(Operation::ALL[i]),
            6 => app.go_to_ranking(),
            7 => app.go_to_mistakes(),
            _ => {}
        },
        _ => {}
    }
}

fn handle_level_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_home(),
        KeyCode::Char(c @ '1'..='3') => {
            let idx = c as usize - '1' as usize;
            app.start_round(Level::ALL[idx]);
        }
        KeyCode::Up | KeyCode::Char('k') => app.level_menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.level_menu.next(),
        KeyCode::Enter => {
            if let Some(&level) = Level::ALL.get(app.level_menu.selected) {
                app.start_round(level);
            }
        }
        _ => {}
    }
}

fn handle_game_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.go_to_home(),
        KeyCode::Char(c @ '1'..='4') => app.answer(c as usize - '1' as usize),
        KeyCode::Char('t') => app.extend_time(),
        KeyCode::Char('a') => app.reveal_answer(),
        _ => {}
    }
}

fn handle_result_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.retry_round(),
        KeyCode::Char('e') => app.start_training(),
        KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => app.go_to_home(),
        _ => {}
    }
}

fn handle_ranking_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('x') => app.clear_high_scores(),
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_home(),
        _ => {}
    }
}

fn handle_mistakes_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.start_training(),
        KeyCode::Char('x') => app.clear_error_log(),
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_home(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    let layout = AppLayout::new(area);
    render_header(frame, app, layout.header);

    match app.screen {
        AppScreen::Home => frame.render_widget(&app.menu, centered(layout.main, 60)),
        AppScreen::LevelSelect => frame.render_widget(&app.level_menu, centered(layout.main, 60)),
        AppScreen::Game => render_game(frame, app, &layout),
        AppScreen::RoundResult => {
            if let Some(ref stats) = app.round_stats {
                frame.render_widget(RoundResults::new(stats, app.theme), centered(layout.main, 70));
            }
        }
        AppScreen::Ranking => {
            let entries = app.controller.ranking();
            frame.render_widget(Ranking::new(&entries, app.theme), centered(layout.main, 60));
        }
        AppScreen::Mistakes => {
            let total = app.controller.profile().error_log.len();
            let list = ErrorList::new(app.controller.recent_errors(15), total, app.theme);
            frame.render_widget(list, centered(layout.main, 90));
        }
    }

    if app.screen != AppScreen::Game
        && let Some(notice) = app.controller.notice()
    {
        let toast_area = Rect::new(
            layout.main.x,
            layout.main.y + layout.main.height.saturating_sub(3),
            layout.main.width,
            3.min(layout.main.height),
        );
        frame.render_widget(NoticeToast::new(notice, app.theme), toast_area);
    }

    render_footer(frame, app, layout.footer);
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let state = app.controller.state();

    let mut info = format!(" XP {} | {} mode", app.controller.xp(), app.mode_label());
    if app.screen == AppScreen::Game {
        info.push_str(&format!(
            " | {} · {} | Score {} | Streak {}",
            state.operation.label(),
            state.level.label(),
            state.score,
            state.consecutive_hits,
        ));
    }
    if app.controller.voice_readout() {
        info.push_str(" | voice");
    }
    if app.sign_language.is_active() {
        info.push_str(" | sign");
    }

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " matemagica ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default().fg(colors.text_dim()).bg(colors.header_bg()),
        ),
    ]))
    .block(Block::bordered().border_style(Style::default().fg(colors.border())))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_game(frame: &mut ratatui::Frame, app: &App, layout: &AppLayout) {
    let colors = &app.theme.colors;
    let Some(ref question) = app.question else {
        return;
    };
    let game = GameLayout::new(layout.main);

    let border = match app.alert {
        Some(TimerAlert::Accessibility) => colors.warning(),
        _ if app.celebrating => colors.success(),
        _ => colors.border_focused(),
    };
    let title = format!(" Question {}/{} ", question.index + 1, question.total);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            &*question.text,
            Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(ref spoken) = app.spoken {
        lines.push(Line::from(Span::styled(
            format!("🔊 {spoken}"),
            Style::default().fg(colors.text_dim()),
        )));
    }
    let question_block = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::bordered()
                .title(title)
                .border_style(Style::default().fg(border)),
        );
    frame.render_widget(question_block, game.question);

    frame.render_widget(TimeBar::new(app.timer, app.theme), game.time_bar);
    frame.render_widget(
        AnswerGrid::new(question.options, app.highlights, layout.tier, app.theme),
        game.answers,
    );
    if let Some(notice) = app.controller.notice() {
        frame.render_widget(NoticeToast::new(notice, app.theme), game.notice);
    }
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let costs = app.controller.costs();
    let extend = costs.extend_offer(app.controller.accessibility_active());
    let extend_hint = format!("[t] +{}s ({} XP)", extend.amount.as_secs(), extend.cost);
    let reveal_hint = format!("[a] Reveal ({} XP)", costs.reveal_cost);

    let hints: Vec<&str> = match app.screen {
        AppScreen::Home => vec!["[1-6] Operation", "[r] Ranking", "[e] Mistakes", "[m] Mode", "[v] Voice", "[l] Sign", "[q] Quit"],
        AppScreen::LevelSelect => vec!["[1-3] Level", "[Enter] Start", "[Esc] Back"],
        AppScreen::Game if app.controller.mode() == GameMode::Rapid => {
            vec!["[1-4] Answer", extend_hint.as_str(), reveal_hint.as_str(), "[m] Study", "[v] Voice", "[Esc] Quit"]
        }
        AppScreen::Game => vec!["[1-4] Answer", "[m] Mode", "[v] Voice", "[Esc] Quit"],
        AppScreen::RoundResult | AppScreen::Ranking | AppScreen::Mistakes => vec!["[q] Back"],
    };
    let lines: Vec<Line> = pack_hint_lines(&hints, area.width as usize)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_dim()))))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn centered(area: Rect, width_percent: u16) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(area);
    horizontal[1]
}
