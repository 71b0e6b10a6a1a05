use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};
use rust_i18n::t;

use kanadrill::session::ScoreTally;

use crate::ui::theme::Theme;

pub struct Scoreboard<'a> {
    score: ScoreTally,
    theme: &'a Theme,
}

impl<'a> Scoreboard<'a> {
    pub fn new(score: ScoreTally, theme: &'a Theme) -> Self {
        Self { score, theme }
    }
}

impl Widget for Scoreboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered().border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(inner);

        let cells = [
            (t!("score.correct"), self.score.correct().to_string(), colors.correct()),
            (t!("score.total"), self.score.total().to_string(), colors.fg()),
            (
                t!("score.accuracy"),
                format!("{:.1}%", self.score.accuracy()),
                colors.accent(),
            ),
        ];

        for ((label, value, color), column) in cells.into_iter().zip(columns.iter()) {
            let line = Line::from(vec![
                Span::styled(format!("{label}: "), Style::default().fg(colors.dim())),
                Span::styled(
                    value,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ]);
            Paragraph::new(line)
                .alignment(Alignment::Center)
                .render(*column, buf);
        }
    }
}
