use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    app::{
        AppState,
        auth::{AccountPanel, AccountState},
    },
    ui::{
        components::card::Card,
        screens::{error_line, render_field_form},
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let account = &state.account;

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Profile
            Constraint::Length(7), // Password
            Constraint::Length(5), // Avatar
            Constraint::Min(0),
        ])
        .split(area);

    render_profile(frame, layout[0], account, &theme);

    let password = Card::new("Change password (p)", &theme)
        .focused(account.editing == Some(AccountPanel::Password));
    let inner = password.inner(layout[1]);
    password.render_frame(frame, layout[1]);
    render_field_form(
        frame,
        inner,
        &account.password,
        account.editing == Some(AccountPanel::Password),
        &theme,
    );

    let avatar = Card::new("Avatar (a upload, x remove)", &theme)
        .focused(account.editing == Some(AccountPanel::Avatar));
    let inner = avatar.inner(layout[2]);
    avatar.render_frame(frame, layout[2]);
    render_field_form(
        frame,
        inner,
        &account.avatar,
        account.editing == Some(AccountPanel::Avatar),
        &theme,
    );
}

fn render_profile(frame: &mut Frame<'_>, area: Rect, account: &AccountState, theme: &Theme) {
    let card = Card::new("Profile", theme);
    let row = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<12}"), Style::default().fg(theme.text_muted)),
            Span::styled(value, Style::default().fg(theme.text)),
        ])
    };

    let mut lines = match account.user() {
        Some(user) => vec![
            row("Username", user.username.clone()),
            row("Email", user.email.clone()),
            row(
                "Name",
                format!("{} {}", user.first_name, user.last_name).trim().to_string(),
            ),
            row(
                "Avatar",
                user.avatar.clone().unwrap_or_else(|| "none".to_string()),
            ),
        ],
        None => vec![row("Username", "-".to_string())],
    };
    lines.push(Line::default());
    lines.push(error_line(account.error(), theme));
    card.render_with(frame, area, Paragraph::new(lines));
}
