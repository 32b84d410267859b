pub mod account;
pub mod login;
pub mod money_flows;
pub mod references;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    app::auth::FieldForm,
    ui::{components::field::InputRow, theme::Theme},
};

/// Renders every field of `form` on its own row, followed by its message.
pub(crate) fn render_field_form(
    frame: &mut Frame<'_>,
    area: Rect,
    form: &FieldForm,
    active: bool,
    theme: &Theme,
) {
    let fields = form.fields();
    let label_width = fields
        .iter()
        .map(|field| field.label.chars().count())
        .max()
        .unwrap_or_default();

    let mut constraints = vec![Constraint::Length(1); fields.len()];
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (index, field) in fields.iter().enumerate() {
        let row = InputRow {
            label: field.label,
            value: form.form().value(field.name),
            secret: field.secret,
            focused: active && index == form.focus(),
            error: form.form().error(field.name),
        };
        row.render(frame, rows[index], label_width, theme);
    }

    if let Some(message) = form.message() {
        frame.render_widget(
            Paragraph::new(Span::styled(message.to_string(), Style::default().fg(theme.error))),
            rows[fields.len() + 1],
        );
    }
}

/// One-line error banner; renders nothing when there is no error.
pub(crate) fn error_line(error: Option<&str>, theme: &Theme) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(theme.error),
        )),
        None => Line::default(),
    }
}
