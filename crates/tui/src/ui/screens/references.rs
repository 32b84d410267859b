use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
};

use crate::{
    app::{
        AppState,
        reference_list::{Draft, FieldKind, FieldSpec, ReferenceListState},
    },
    ui::{
        components::{card::Card, field::InputRow},
        theme::Theme,
    },
};

const COLUMN_WIDTH: usize = 24;

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let references = &state.references;

    let Some(draft) = references.active_draft() else {
        render_table(frame, area, references, &theme);
        return;
    };

    let editor_height = draft_height(references);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(editor_height)])
        .split(area);

    render_table(frame, layout[0], references, &theme);
    render_draft(frame, layout[1], references, draft, &theme);
}

fn render_table(frame: &mut Frame<'_>, area: Rect, references: &ReferenceListState, theme: &Theme) {
    let schema = references.schema();
    let card = Card::new(schema.title, theme)
        .focused(!references.is_drafting())
        .note(format!("{} items", references.items().len()))
        .error(references.error());
    let inner = card.inner(area);
    card.render_frame(frame, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Rows
        ])
        .split(inner);

    let header = schema
        .fields
        .iter()
        .map(|field| format!("{:<COLUMN_WIDTH$}", field.label))
        .collect::<String>();
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("  {:<6}{header}", "#"),
            Style::default()
                .fg(theme.text_muted)
                .add_modifier(Modifier::BOLD),
        )),
        layout[0],
    );

    if references.items().is_empty() {
        let empty_msg = Paragraph::new(Line::from(vec![
            Span::raw("Nothing here yet. Press "),
            Span::styled("c", Style::default().fg(theme.accent)),
            Span::raw(" to create one."),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(empty_msg, layout[1]);
    } else {
        let items = references
            .items()
            .iter()
            .map(|record| {
                let cells = schema
                    .fields
                    .iter()
                    .map(|field| cell(&references.display_value(field, record)))
                    .collect::<String>();
                ListItem::new(Line::from(format!("{:<6}{cells}", record.id)))
            })
            .collect::<Vec<_>>();

        let mut list_state = ListState::default();
        list_state.select(Some(references.selected));

        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("» ");
        frame.render_stateful_widget(list, layout[1], &mut list_state);
    }
}

/// One fixed-width column; multi-line text is flattened and long text cut.
fn cell(value: &str) -> String {
    let flat = value.replace('\n', " ");
    let mut text: String = flat.chars().take(COLUMN_WIDTH - 2).collect();
    if flat.chars().count() > COLUMN_WIDTH - 2 {
        text.pop();
        text.push('…');
    }
    format!("{text:<COLUMN_WIDTH$}")
}

fn draft_height(references: &ReferenceListState) -> u16 {
    let rows: u16 = references
        .schema()
        .fields
        .iter()
        .map(|field| match field.kind {
            FieldKind::LongText => 4,
            FieldKind::Text | FieldKind::Select(_) => 1,
        })
        .sum();
    rows + 4
}

fn render_draft(
    frame: &mut Frame<'_>,
    area: Rect,
    references: &ReferenceListState,
    draft: &Draft,
    theme: &Theme,
) {
    let title = match references.editing() {
        Some((id, _)) => format!("Edit #{id}"),
        None => format!("New {}", references.schema().title.to_lowercase()),
    };
    let card = Card::new(&title, theme).focused(true);
    let inner = card.inner(area);
    card.render_frame(frame, area);

    let fields = references.schema().fields;
    let mut constraints = fields
        .iter()
        .map(|field| match field.kind {
            FieldKind::LongText => Constraint::Length(4),
            FieldKind::Text | FieldKind::Select(_) => Constraint::Length(1),
        })
        .collect::<Vec<_>>();
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(inner);

    for (index, field) in fields.iter().enumerate() {
        let focused = index == draft.focus;
        match field.kind {
            FieldKind::LongText => {
                render_long_text(frame, rows[index], field, draft.value(field.name), focused, theme);
            }
            FieldKind::Text | FieldKind::Select(_) => {
                let field_label = label(field);
                let value = draft_display(references, field, draft, focused);
                let row = InputRow {
                    label: &field_label,
                    value: &value,
                    secret: false,
                    focused,
                    error: None,
                };
                row.render(frame, rows[index], 14, theme);
            }
        }
    }
}

fn label(field: &FieldSpec) -> String {
    if field.required {
        format!("{} *", field.label)
    } else {
        field.label.to_string()
    }
}

fn draft_display(
    references: &ReferenceListState,
    field: &FieldSpec,
    draft: &Draft,
    focused: bool,
) -> String {
    let raw = draft.value(field.name);
    let FieldKind::Select(_) = field.kind else {
        return raw.to_string();
    };
    let name = raw
        .trim()
        .parse()
        .ok()
        .and_then(|id| references.lookup(field.name)?.name_of(id))
        .unwrap_or("choose with ←/→");
    if focused {
        format!("‹ {name} ›")
    } else {
        name.to_string()
    }
}

fn render_long_text(
    frame: &mut Frame<'_>,
    area: Rect,
    field: &FieldSpec,
    value: &str,
    focused: bool,
    theme: &Theme,
) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(16), Constraint::Min(0)])
        .split(area);

    frame.render_widget(
        Paragraph::new(Span::styled(label(field), Style::default().fg(theme.text_muted))),
        layout[0],
    );
    let cursor = if focused { "│" } else { "" };
    let style = if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.text)
    };
    let lines = format!("{value}{cursor}")
        .split('\n')
        .map(|line| Line::styled(line.to_string(), style))
        .collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), layout[1]);
}
