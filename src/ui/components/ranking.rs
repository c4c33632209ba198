use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::round::Operation;
use crate::ui::theme::Theme;

pub struct Ranking<'a> {
    pub entries: &'a [(Operation, u64)],
    pub theme: &'a Theme,
}

impl<'a> Ranking<'a> {
    pub fn new(entries: &'a [(Operation, u64)], theme: &'a Theme) -> Self {
        Self { entries, theme }
    }
}

impl Widget for Ranking<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Ranking ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));

        let mut lines = vec![Line::from("")];
        if self.entries.is_empty() {
            lines.push(Line::from(Span::styled(
                "  No scores yet. Finish a rapid round to get ranked.",
                Style::default().fg(colors.text_dim()),
            )));
        }
        for (place, (op, score)) in self.entries.iter().enumerate() {
            let style = if place == 0 {
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            lines.push(Line::from(vec![
                Span::styled(format!("  {:>2}. ", place + 1), style),
                Span::styled(format!("{:<16}", op.label()), style),
                Span::styled(format!("{score:>8}"), style),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  [x] Clear ranking  [q] Back",
            Style::default().fg(colors.accent()),
        )));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
