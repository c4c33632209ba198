use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::store::schema::ErrorRecord;
use crate::ui::theme::Theme;

/// Most recent mistakes, newest first.
pub struct ErrorList<'a> {
    pub records: Vec<&'a ErrorRecord>,
    pub total: usize,
    pub theme: &'a Theme,
}

impl<'a> ErrorList<'a> {
    pub fn new(records: Vec<&'a ErrorRecord>, total: usize, theme: &'a Theme) -> Self {
        Self {
            records,
            total,
            theme,
        }
    }
}

impl Widget for ErrorList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" Mistakes ({}) ", self.total))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));

        let mut lines = vec![Line::from("")];
        if self.records.is_empty() {
            lines.push(Line::from(Span::styled(
                "  Nothing to review.",
                Style::default().fg(colors.text_dim()),
            )));
        }
        for record in &self.records {
            let when = record.timestamp.format("%Y-%m-%d %H:%M").to_string();
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<14}", record.question), Style::default().fg(colors.fg())),
                Span::styled(
                    format!(" you: {:<10}", record.submitted.to_string()),
                    Style::default().fg(colors.wrong()),
                ),
                Span::styled(
                    format!(" answer: {:<6}", record.correct_answer),
                    Style::default().fg(colors.correct()),
                ),
                Span::styled(format!(" {when}"), Style::default().fg(colors.text_dim())),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  [Enter] Train  [x] Clear  [q] Back",
            Style::default().fg(colors.accent()),
        )));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
