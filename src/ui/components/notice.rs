use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::events::Notice;
use crate::ui::theme::Theme;

pub struct NoticeToast<'a> {
    pub notice: &'a Notice,
    pub theme: &'a Theme,
}

impl<'a> NoticeToast<'a> {
    pub fn new(notice: &'a Notice, theme: &'a Theme) -> Self {
        Self { notice, theme }
    }
}

impl Widget for NoticeToast<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let color = colors.severity(self.notice.severity);

        let block = Block::bordered()
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(colors.bg()));
        Paragraph::new(Line::from(self.notice.text.as_str()))
            .alignment(Alignment::Center)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .block(block)
            .render(area, buf);
    }
}
