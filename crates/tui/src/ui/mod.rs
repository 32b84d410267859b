pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    app::{AppState, FlowMode, Screen, Section, auth::AccountPanel},
    ui::components::hints::{KeyHint, hint_separator, hints_to_spans},
};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    match state.screen {
        Screen::Login => screens::login::render(frame, area, state),
        Screen::SignUp => screens::login::render_signup(frame, area, state),
        Screen::Main => render_shell(frame, area, state),
    }
    components::confirm::render(frame, area, state.confirm);
    components::toast::render(frame, area, state.toast.as_ref());
}

fn render_shell(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();

    // Main layout: info bar, tabs, content, bottom bar
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Length(2), // Tab bar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Bottom bar
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, &theme);
    components::tabs::render_tabs(frame, layout[1], state.section, &theme);

    match state.section {
        Section::MoneyFlows => screens::money_flows::render(frame, layout[2], state),
        Section::Account => screens::account::render(frame, layout[2], state),
        Section::Statuses | Section::Types | Section::Categories | Section::Subcategories => {
            screens::references::render(frame, layout[2], state);
        }
    }

    render_bottom_bar(frame, layout[3], state, &theme);
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let user = state
        .account
        .user()
        .map(|user| user.username.as_str())
        .unwrap_or("-");

    let mut spans = vec![
        Span::styled("Server", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", state.base_url)),
        Span::styled("User", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {user}")),
    ];
    if state.busy {
        spans.push(Span::styled("  working...", Style::default().fg(theme.accent)));
    }
    let line = Line::from(spans);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let mut parts = Vec::new();
    if !state.is_typing() {
        parts.extend(components::tabs::tab_shortcuts(theme));
        parts.push(hint_separator(theme));
    }

    parts.extend(hints_to_spans(context_hints(state), theme));

    if !state.is_typing() {
        parts.push(hint_separator(theme));
        parts.push(Span::styled("q", Style::default().fg(theme.accent)));
        parts.push(Span::raw(" quit"));
    }

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

const FLOW_LIST_HINTS: &[KeyHint] = &[
    KeyHint::new("j/k", "move"),
    KeyHint::new("n/p", "page"),
    KeyHint::new("/", "filter"),
    KeyHint::new("x", "clear"),
    KeyHint::new("c", "new"),
    KeyHint::new("Enter", "open"),
];

const FILTER_HINTS: &[KeyHint] = &[
    KeyHint::new("Tab", "next"),
    KeyHint::new("Enter", "apply dates"),
    KeyHint::new("Esc", "done"),
];

const FLOW_DETAIL_HINTS: &[KeyHint] = &[
    KeyHint::new("e", "edit"),
    KeyHint::new("d", "delete"),
    KeyHint::new("r", "reload"),
    KeyHint::new("b", "back"),
];

const FLOW_FORM_HINTS: &[KeyHint] = &[
    KeyHint::new("Tab", "next"),
    KeyHint::new("←/→", "choose"),
    KeyHint::new("Enter", "save"),
    KeyHint::new("Esc", "cancel"),
];

const REFERENCE_HINTS: &[KeyHint] = &[
    KeyHint::new("j/k", "move"),
    KeyHint::new("c", "new"),
    KeyHint::new("e", "edit"),
    KeyHint::new("d", "delete"),
    KeyHint::new("r", "reload"),
];

const DRAFT_HINTS: &[KeyHint] = &[
    KeyHint::new("Tab", "next"),
    KeyHint::new("←/→", "choose"),
    KeyHint::new("Ctrl+S", "save"),
    KeyHint::new("Esc", "cancel"),
];

const ACCOUNT_HINTS: &[KeyHint] = &[
    KeyHint::new("p", "password"),
    KeyHint::new("a", "avatar"),
    KeyHint::new("x", "remove avatar"),
    KeyHint::new("o", "log out"),
];

const ACCOUNT_FORM_HINTS: &[KeyHint] = &[
    KeyHint::new("Tab", "next"),
    KeyHint::new("Enter", "save"),
    KeyHint::new("Esc", "cancel"),
];

/// Returns context-specific keyboard hints based on current section and mode.
fn context_hints(state: &AppState) -> &'static [KeyHint] {
    match state.section {
        Section::MoneyFlows => match state.flows.mode {
            FlowMode::List if state.flows.view.editing => FILTER_HINTS,
            FlowMode::List => FLOW_LIST_HINTS,
            FlowMode::Detail(_) => FLOW_DETAIL_HINTS,
            FlowMode::Create(_) | FlowMode::Edit(_) => FLOW_FORM_HINTS,
        },
        Section::Account => match state.account.editing {
            Some(AccountPanel::Password | AccountPanel::Avatar) => ACCOUNT_FORM_HINTS,
            None => ACCOUNT_HINTS,
        },
        Section::Statuses | Section::Types | Section::Categories | Section::Subcategories => {
            if state.references.is_drafting() {
                DRAFT_HINTS
            } else {
                REFERENCE_HINTS
            }
        }
    }
}
