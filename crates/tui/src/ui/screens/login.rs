use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Clear, Paragraph},
};

use crate::{
    app::{AppState, auth::FieldForm},
    ui::{
        components::{
            card::Card,
            centered_box,
            hints::{KeyHint, hints_to_spans},
        },
        screens::render_field_form,
        theme::Theme,
    },
};

const LOGIN_HINTS: [KeyHint; 4] = [
    KeyHint::new("Tab", "next"),
    KeyHint::new("Enter", "log in"),
    KeyHint::new("Ctrl+N", "sign up"),
    KeyHint::new("Ctrl+R", "reset password"),
];

const SIGNUP_HINTS: [KeyHint; 3] = [
    KeyHint::new("Tab", "next"),
    KeyHint::new("Enter", "create account"),
    KeyHint::new("Esc", "back"),
];

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    render_auth_box(frame, area, "log in", &state.login.form, &LOGIN_HINTS, state);
}

pub fn render_signup(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    render_auth_box(frame, area, "sign up", &state.signup.form, &SIGNUP_HINTS, state);
}

fn render_auth_box(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    form: &FieldForm,
    hints: &[KeyHint],
    state: &AppState,
) {
    let theme = Theme::default();
    let box_height = form.fields().len() as u16 + 6;
    let card_area = centered_box(60.min(area.width), box_height.min(area.height), area);

    frame.render_widget(Clear, card_area);
    let mut card = Card::new(title, &theme).focused(true);
    if state.busy {
        card = card.note("working...");
    }
    let inner = card.inner(card_area);
    card.render_frame(frame, card_area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
        .margin(1)
        .split(inner);

    render_field_form(frame, layout[0], form, true, &theme);
    frame.render_widget(Paragraph::new(Line::from(hints_to_spans(hints, &theme))), layout[1]);
    frame.render_widget(
        Paragraph::new(Line::styled(
            state.base_url.clone(),
            Style::default().fg(theme.text_muted),
        )),
        layout[2],
    );
}
