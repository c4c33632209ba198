use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::layout::{LayoutTier, answer_cells};
use crate::ui::theme::Theme;

/// Which options to colour after an answer or a reveal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Highlights {
    pub chosen: Option<usize>,
    pub correct: Option<usize>,
}

impl Highlights {
    pub fn is_set(&self) -> bool {
        self.chosen.is_some() || self.correct.is_some()
    }
}

pub struct AnswerGrid<'a> {
    pub options: [u32; 4],
    pub highlights: Highlights,
    pub tier: LayoutTier,
    pub theme: &'a Theme,
}

impl<'a> AnswerGrid<'a> {
    pub fn new(options: [u32; 4], highlights: Highlights, tier: LayoutTier, theme: &'a Theme) -> Self {
        Self {
            options,
            highlights,
            tier,
            theme,
        }
    }
}

impl Widget for AnswerGrid<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let cells = answer_cells(area, self.tier);

        for (i, (cell, value)) in cells.iter().zip(self.options.iter()).enumerate() {
            let (border, text) = if self.highlights.correct == Some(i) {
                (colors.correct(), colors.correct())
            } else if self.highlights.chosen == Some(i) {
                (colors.wrong(), colors.wrong())
            } else if self.highlights.is_set() {
                (colors.border(), colors.text_dim())
            } else {
                (colors.border(), colors.fg())
            };

            let block = Block::bordered()
                .title(format!(" {} ", i + 1))
                .border_style(Style::default().fg(border))
                .style(Style::default().bg(colors.option_bg()));
            let inner = block.inner(*cell);
            block.render(*cell, buf);

            let mut lines = Vec::new();
            if inner.height > 1 {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(value.to_string()));
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .style(Style::default().fg(text).add_modifier(Modifier::BOLD))
                .render(inner, buf);
        }
    }
}
