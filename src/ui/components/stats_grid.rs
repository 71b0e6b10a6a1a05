use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};
use rust_i18n::t;

use kanadrill::catalog::{Catalog, Family};
use kanadrill::engine::mastery::{GlyphMastery, OverallStats, family_mastery};
use kanadrill::store::StatsMap;

use crate::ui::theme::Theme;

/// Cell footprint: glyph on one row, accuracy below it.
const CELL_WIDTH: u16 = 6;
const CELL_HEIGHT: u16 = 2;

/// Whole-session progress: overall figures plus one mastery grid per family.
pub struct StatsGrid<'a> {
    catalog: &'a Catalog,
    stats: &'a StatsMap,
    theme: &'a Theme,
}

impl<'a> StatsGrid<'a> {
    pub fn new(catalog: &'a Catalog, stats: &'a StatsMap, theme: &'a Theme) -> Self {
        Self {
            catalog,
            stats,
            theme,
        }
    }
}

impl Widget for StatsGrid<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let overall = OverallStats::from_stats(self.stats);
        let summary = Line::from(vec![
            Span::styled(
                format!("{}: ", t!("stats.total_answered")),
                Style::default().fg(colors.dim()),
            ),
            Span::styled(
                overall.total.to_string(),
                Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled(
                format!("{}: ", t!("stats.overall_accuracy")),
                Style::default().fg(colors.dim()),
            ),
            Span::styled(
                format!("{:.1}%", overall.accuracy_percent()),
                Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
            ),
        ]);
        Paragraph::new(summary)
            .alignment(Alignment::Center)
            .block(
                Block::bordered()
                    .title(format!(" {} ", t!("stats.title")))
                    .border_style(Style::default().fg(colors.border())),
            )
            .render(layout[0], buf);

        let family_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
            .split(layout[1]);

        for (family, family_area) in Family::ALL.into_iter().zip(family_areas.iter()) {
            let rows = family_mastery(self.catalog, family, self.stats);
            render_family(family, &rows, *family_area, buf, self.theme);
        }
    }
}

fn render_family(family: Family, rows: &[GlyphMastery], area: Rect, buf: &mut Buffer, theme: &Theme) {
    let colors = &theme.colors;

    let block = Block::bordered()
        .title(format!(" {} ", family.label()))
        .border_style(Style::default().fg(colors.border()));
    let inner = block.inner(area);
    block.render(area, buf);

    let columns = (inner.width / CELL_WIDTH).max(1) as usize;
    for (i, row) in rows.iter().enumerate() {
        let x = inner.x + (i % columns) as u16 * CELL_WIDTH;
        let y = inner.y + (i / columns) as u16 * CELL_HEIGHT;
        if y + 1 >= inner.y + inner.height {
            break;
        }
        let color = colors.mastery(row.mastery);
        let accuracy = match row.accuracy_percent() {
            Some(pct) => format!("{pct}%"),
            None => t!("stats.unseen").to_string(),
        };
        buf.set_string(
            x + 1,
            y,
            &row.glyph,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        );
        buf.set_string(x + 1, y + 1, &accuracy, Style::default().fg(color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanadrill::store::CharacterStat;

    #[test]
    fn test_renders_glyphs_and_accuracy() {
        let catalog = Catalog::load().unwrap();
        let mut stats = StatsMap::new();
        stats.insert("あ".into(), CharacterStat { correct: 1, total: 2 });
        let theme = Theme::default();

        let area = Rect::new(0, 0, 120, 30);
        let mut buf = Buffer::empty(area);
        StatsGrid::new(&catalog, &stats, &theme).render(area, &mut buf);

        let text: String = buf.content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("50%"));
        assert!(text.contains("あ"));
        assert!(text.contains("ア"));
    }
}
