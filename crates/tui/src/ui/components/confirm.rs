use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};

use crate::{
    app::Confirm,
    ui::{
        components::{card::Card, centered_box},
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, confirm: Option<Confirm>) {
    let Some(confirm) = confirm else {
        return;
    };
    let theme = Theme::default();
    let prompt = confirm.prompt();
    let width = (prompt.chars().count() as u16 + 6).max(30).min(area.width);
    let rect = centered_box(width, 5, area);

    frame.render_widget(Clear, rect);
    let lines = vec![
        Line::from(Span::styled(prompt, Style::default().fg(theme.text))),
        Line::from(vec![
            Span::styled("y", Style::default().fg(theme.accent)),
            Span::raw(" yes  "),
            Span::styled("n", Style::default().fg(theme.accent)),
            Span::raw(" no"),
        ]),
    ];
    Card::new("Confirm", &theme).focused(true).render_with(
        frame,
        rect,
        Paragraph::new(lines).alignment(Alignment::Center),
    );
}
