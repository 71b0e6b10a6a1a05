use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Widget};

use crate::ui::theme::Theme;

/// Below this fraction the bar switches to the warning color.
const LOW_TIME_RATIO: f64 = 0.3;

/// Countdown bar for the current question.
pub struct TimerBar<'a> {
    label: String,
    ratio: f64,
    theme: &'a Theme,
}

impl<'a> TimerBar<'a> {
    pub fn new(label: String, ratio: f64, theme: &'a Theme) -> Self {
        Self {
            label,
            ratio: ratio.clamp(0.0, 1.0),
            theme,
        }
    }
}

impl Widget for TimerBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered().border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let filled_width = (self.ratio * inner.width as f64).round() as u16;
        let filled = if self.ratio < LOW_TIME_RATIO {
            colors.warning()
        } else {
            colors.bar_filled()
        };

        for x in inner.x..inner.x + inner.width {
            let style = if x < inner.x + filled_width {
                Style::default().fg(colors.bg()).bg(filled)
            } else {
                Style::default().fg(colors.fg()).bg(colors.bar_empty())
            };
            buf[(x, inner.y)].set_style(style);
        }

        let label_width = Line::from(self.label.as_str()).width() as u16;
        let label_x = inner.x + inner.width.saturating_sub(label_width) / 2;
        buf.set_string(label_x, inner.y, &self.label, Style::default().fg(colors.fg()));
    }
}
