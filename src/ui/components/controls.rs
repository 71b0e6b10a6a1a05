use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};
use rust_i18n::t;

use kanadrill::catalog::{Family, FamilySelection};
use kanadrill::session::TimerDuration;

use crate::ui::theme::Theme;

/// Family toggles and the timer setting, with their shortcut keys.
pub struct Controls<'a> {
    families: &'a FamilySelection,
    timer: TimerDuration,
    theme: &'a Theme,
}

impl<'a> Controls<'a> {
    pub fn new(families: &'a FamilySelection, timer: TimerDuration, theme: &'a Theme) -> Self {
        Self {
            families,
            timer,
            theme,
        }
    }
}

pub fn family_key(family: Family) -> char {
    match family {
        Family::Hiragana => 'h',
        Family::Katakana => 'k',
    }
}

pub fn timer_label(timer: TimerDuration) -> String {
    match timer.seconds() {
        Some(n) => t!("timer.seconds", n = n).to_string(),
        None => t!("timer.unlimited").to_string(),
    }
}

impl Widget for Controls<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered().border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut spans = Vec::new();
        for family in Family::ALL {
            let style = if self.families.contains(family) {
                Style::default()
                    .fg(colors.header_fg())
                    .bg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.dim())
            };
            spans.push(Span::styled(
                format!(" [{}] {} ", family_key(family), family.label()),
                style,
            ));
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            format!("[t] {}: ", t!("controls.timer")),
            Style::default().fg(colors.dim()),
        ));
        spans.push(Span::styled(
            timer_label(self.timer),
            Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
        ));

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(inner, buf);
    }
}
