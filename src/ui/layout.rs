use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Vertical bands of the practice screen.
pub struct PracticeLayout {
    pub header: Rect,
    pub scoreboard: Rect,
    pub controls: Rect,
    pub card: Rect,
    pub timer: Option<Rect>,
    pub footer: Rect,
}

impl PracticeLayout {
    pub fn new(area: Rect, show_timer: bool) -> Self {
        let mut constraints = vec![
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(9),
        ];
        if show_timer {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Length(1));

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let (timer, footer) = if show_timer {
            (Some(rows[4]), rows[5])
        } else {
            (None, rows[4])
        };

        Self {
            header: rows[0],
            scoreboard: rows[1],
            controls: rows[2],
            card: rows[3],
            timer,
            footer,
        }
    }
}

/// Centered column of at most `max_width` cells, full height.
pub fn centered_column(max_width: u16, area: Rect) -> Rect {
    let width = max_width.min(area.width);
    let left = area.x.saturating_add(area.width.saturating_sub(width) / 2);
    Rect::new(left, area.y, width, area.height)
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 40;
    const MIN_POPUP_HEIGHT: u16 = 7;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}
