use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::result::RoundStats;
use crate::ui::theme::Theme;

pub struct RoundResults<'a> {
    pub stats: &'a RoundStats,
    pub theme: &'a Theme,
}

impl<'a> RoundResults<'a> {
    pub fn new(stats: &'a RoundStats, theme: &'a Theme) -> Self {
        Self { stats, theme }
    }
}

impl Widget for RoundResults<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Round Complete ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        let title = format!(
            "{} · {}",
            self.stats.operation.label(),
            self.stats.level.label()
        );
        Paragraph::new(Line::from(Span::styled(
            title,
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(layout[0], buf);

        let score_text = format!("{}", self.stats.score);
        let best_text = format!("  (previous best {})", self.stats.previous_best);
        Paragraph::new(Line::from(vec![
            Span::styled("  Score:    ", Style::default().fg(colors.fg())),
            Span::styled(
                &*score_text,
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(&*best_text, Style::default().fg(colors.text_dim())),
        ]))
        .render(layout[1], buf);

        let acc = self.stats.accuracy();
        let acc_color = if acc >= 90.0 {
            colors.success()
        } else if acc >= 60.0 {
            colors.warning()
        } else {
            colors.wrong()
        };
        let acc_text = format!("{acc:.0}%");
        let acc_detail = format!("  ({} right, {} missed)", self.stats.hits, self.stats.misses);
        Paragraph::new(Line::from(vec![
            Span::styled("  Accuracy: ", Style::default().fg(colors.fg())),
            Span::styled(
                &*acc_text,
                Style::default().fg(acc_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(&*acc_detail, Style::default().fg(colors.text_dim())),
        ]))
        .render(layout[2], buf);

        let streak_text = format!("{}", self.stats.best_streak);
        Paragraph::new(Line::from(vec![
            Span::styled("  Streak:   ", Style::default().fg(colors.fg())),
            Span::styled(&*streak_text, Style::default().fg(colors.fg())),
        ]))
        .render(layout[3], buf);

        let xp_text = format!("+{}", self.stats.xp_gained);
        let xp_total = format!("  (total {})", self.stats.xp_total);
        Paragraph::new(Line::from(vec![
            Span::styled("  XP:       ", Style::default().fg(colors.fg())),
            Span::styled(&*xp_text, Style::default().fg(colors.success())),
            Span::styled(&*xp_total, Style::default().fg(colors.text_dim())),
        ]))
        .render(layout[4], buf);

        let summary_color = if self.stats.new_record {
            colors.success()
        } else {
            colors.fg()
        };
        Paragraph::new(Line::from(Span::styled(
            format!("  {}", self.stats.summary()),
            Style::default()
                .fg(summary_color)
                .add_modifier(Modifier::BOLD),
        )))
        .render(layout[5], buf);

        let mut help = vec![
            Span::styled("  [r] Retry  ", Style::default().fg(colors.accent())),
            Span::styled("[q] Menu  ", Style::default().fg(colors.accent())),
        ];
        if self.stats.has_saved_errors {
            help.push(Span::styled(
                "[e] Train mistakes",
                Style::default().fg(colors.accent()),
            ));
        }
        Paragraph::new(Line::from(help)).render(layout[7], buf);
    }
}
