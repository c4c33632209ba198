use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::round::{Level, Operation};
use crate::ui::theme::Theme;

pub struct MenuItem {
    pub key: String,
    pub label: String,
    pub description: String,
}

pub struct Menu<'a> {
    pub title: String,
    pub subtitle: String,
    pub items: Vec<MenuItem>,
    pub selected: usize,
    pub theme: &'a Theme,
}

impl<'a> Menu<'a> {
    /// Home screen: one entry per operation, then ranking and mistakes.
    pub fn home(theme: &'a Theme) -> Self {
        let mut items: Vec<MenuItem> = Operation::ALL
            .iter()
            .enumerate()
            .map(|(i, op)| MenuItem {
                key: (i + 1).to_string(),
                label: op.label().to_string(),
                description: operation_description(*op).to_string(),
            })
            .collect();
        items.push(MenuItem {
            key: "r".to_string(),
            label: "Ranking".to_string(),
            description: "Best score for each operation".to_string(),
        });
        items.push(MenuItem {
            key: "e".to_string(),
            label: "Mistakes".to_string(),
            description: "Review and retrain missed questions".to_string(),
        });
        Self {
            title: "matemagica".to_string(),
            subtitle: "Mental Arithmetic Trainer".to_string(),
            items,
            selected: 0,
            theme,
        }
    }

    pub fn levels(operation: Operation, theme: &'a Theme) -> Self {
        let items = Level::ALL
            .iter()
            .enumerate()
            .map(|(i, level)| MenuItem {
                key: (i + 1).to_string(),
                label: level.label().to_string(),
                description: format!("Score x{}", level.multiplier()),
            })
            .collect();
        Self {
            title: operation.label().to_string(),
            subtitle: "Choose a level".to_string(),
            items,
            selected: 0,
            theme,
        }
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len() - 1;
        }
    }
}

fn operation_description(op: Operation) -> &'static str {
    match op {
        Operation::Addition => "Sums from single digits to hundreds",
        Operation::Subtraction => "Differences that never go negative",
        Operation::Multiplication => "Times tables and beyond",
        Operation::Division => "Exact quotients only",
        Operation::Exponentiation => "Squares, cubes and higher powers",
        Operation::Root => "Square, cube and fourth roots",
    }
}

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                &*self.title,
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(&*self.subtitle, Style::default().fg(colors.fg()))),
        ];

        let title = Paragraph::new(title_lines).alignment(Alignment::Center);
        title.render(layout[0], buf);

        let menu_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                self.items
                    .iter()
                    .map(|_| Constraint::Length(2))
                    .collect::<Vec<_>>(),
            )
            .split(layout[2]);

        for (i, item) in self.items.iter().enumerate() {
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };

            let label_text = format!(" {indicator} [{key}] {label}", key = item.key, label = item.label);
            let desc_text = format!("     {}", item.description);

            let lines = vec![
                Line::from(Span::styled(
                    &*label_text,
                    Style::default()
                        .fg(if is_selected {
                            colors.accent()
                        } else {
                            colors.fg()
                        })
                        .add_modifier(if is_selected {
                            Modifier::BOLD
                        } else {
                            Modifier::empty()
                        }),
                )),
                Line::from(Span::styled(
                    &*desc_text,
                    Style::default().fg(colors.text_dim()),
                )),
            ];

            let p = Paragraph::new(lines);
            if i < menu_layout.len() {
                p.render(menu_layout[i], buf);
            }
        }
    }
}
