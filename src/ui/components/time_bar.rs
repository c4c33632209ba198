use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Widget};

use crate::engine::timer::TimerView;
use crate::ui::theme::Theme;

/// Countdown bar. The fill colour follows the timer's colour zone.
pub struct TimeBar<'a> {
    pub view: TimerView,
    pub theme: &'a Theme,
}

impl<'a> TimeBar<'a> {
    pub fn new(view: TimerView, theme: &'a Theme) -> Self {
        Self { view, theme }
    }

    fn label(&self) -> String {
        if self.view.unlimited {
            "no time limit".to_string()
        } else {
            format!("{:.1}s", self.view.remaining.as_secs_f64())
        }
    }
}

impl Widget for TimeBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Time ")
            .border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let ratio = self.view.fraction.clamp(0.0, 1.0);
        let filled_width = (ratio * inner.width as f64).round() as u16;
        let fill = colors.zone(self.view.zone);
        let label = self.label();

        for x in inner.x..inner.x + inner.width {
            let style = if x < inner.x + filled_width {
                Style::default().fg(colors.bg()).bg(fill)
            } else {
                Style::default().fg(colors.fg()).bg(colors.bar_empty())
            };
            buf[(x, inner.y)].set_style(style);
        }

        let label_x = inner.x + (inner.width.saturating_sub(label.chars().count() as u16)) / 2;
        buf.set_string(label_x, inner.y, &label, Style::default().fg(colors.fg()));
    }
}
