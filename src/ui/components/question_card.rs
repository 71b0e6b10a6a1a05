use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};
use rust_i18n::t;

use kanadrill::engine::Question;
use kanadrill::session::Feedback;

use crate::ui::theme::Theme;

/// How a choice is drawn once the question has an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChoiceState {
    Open,
    Right,
    WrongPick,
    Inactive,
}

fn choice_state(choice: &str, feedback: Option<&Feedback<'_>>) -> ChoiceState {
    match feedback {
        None => ChoiceState::Open,
        Some(f) if f.correct == choice => ChoiceState::Right,
        Some(f) if f.chosen == Some(choice) => ChoiceState::WrongPick,
        Some(_) => ChoiceState::Inactive,
    }
}

pub struct QuestionCard<'a> {
    question: Option<&'a Question>,
    feedback: Option<Feedback<'a>>,
    theme: &'a Theme,
}

impl<'a> QuestionCard<'a> {
    pub fn new(
        question: Option<&'a Question>,
        feedback: Option<Feedback<'a>>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            question,
            feedback,
            theme,
        }
    }
}

impl Widget for QuestionCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(question) = self.question else {
            Paragraph::new(Line::from(Span::styled(
                t!("card.no_question").to_string(),
                Style::default().fg(colors.dim()),
            )))
            .alignment(Alignment::Center)
            .render(inner, buf);
            return;
        };

        let mut lines = Vec::new();
        if self.feedback.is_some_and(|f| f.timed_out) {
            lines.push(Line::from(Span::styled(
                t!("card.time_up").to_string(),
                Style::default()
                    .fg(colors.incorrect())
                    .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
            )));
        } else {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {} ", question.prompt.glyph),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));

        for (i, choice) in question.choices.iter().enumerate() {
            let style = match choice_state(choice, self.feedback.as_ref()) {
                ChoiceState::Open => Style::default().fg(colors.fg()),
                ChoiceState::Right => Style::default()
                    .fg(colors.bg())
                    .bg(colors.correct())
                    .add_modifier(Modifier::BOLD),
                ChoiceState::WrongPick => Style::default().fg(colors.bg()).bg(colors.incorrect()),
                ChoiceState::Inactive => Style::default().fg(colors.dim()),
            };
            lines.push(Line::from(Span::styled(
                format!("  [{}] {:<6}", i + 1, choice),
                style,
            )));
        }

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(inner, buf);
    }
}
