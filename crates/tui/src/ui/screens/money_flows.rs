use api_types::{money_flow::MoneyFlow, reference::Named};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use crate::{
    app::{
        AppState, FlowMode, FlowsState,
        money_flow::{
            DATE_FORMAT, FLOW_FIELDS, FlowInput, MoneyFlowForm, ReferenceData,
            detail::{FlowClass, FlowDetailState},
            list::FilterField,
        },
    },
    ui::{
        components::{card::Card, field::InputRow, money::styled_amount},
        screens::error_line,
        theme::Theme,
    },
};

const MISSING: &str = "-";

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let flows = &state.flows;
    match &flows.mode {
        FlowMode::List => render_list(frame, area, flows, &state.income_type_names, &theme),
        FlowMode::Detail(detail) => {
            render_detail(frame, area, detail, &state.income_type_names, &theme);
        }
        FlowMode::Create(create) => render_form(
            frame,
            area,
            "New money flow",
            &create.form,
            create.data(),
            create.error(),
            &theme,
        ),
        FlowMode::Edit(edit) => {
            let title = format!("Edit money flow #{}", edit.id());
            if edit.is_loaded() {
                render_form(frame, area, &title, &edit.form, edit.data(), edit.error(), &theme);
            } else {
                let card = Card::new(&title, &theme);
                let text = edit.error().unwrap_or("loading...");
                card.render_with(
                    frame,
                    area,
                    Paragraph::new(error_line(Some(text), &theme)).alignment(Alignment::Center),
                );
            }
        }
    }
}

fn name_or_missing<T: Named>(item: Option<&T>) -> &str {
    item.map(T::name).unwrap_or(MISSING)
}

fn render_list(
    frame: &mut Frame<'_>,
    area: Rect,
    flows: &FlowsState,
    income_type_names: &[String],
    theme: &Theme,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Filters
            Constraint::Min(0),    // Items
            Constraint::Length(1), // Pager
        ])
        .split(area);

    render_filters(frame, layout[0], flows, theme);

    let browser = &flows.browser;
    let card = Card::new("Money flows", theme)
        .focused(!flows.view.editing)
        .error(browser.error());
    let list_area = card.inner(layout[1]);
    card.render_frame(frame, layout[1]);

    if browser.items().is_empty() {
        let empty_msg = Paragraph::new(Line::from(vec![
            Span::raw("No money flows. Press "),
            Span::styled("c", Style::default().fg(theme.accent)),
            Span::raw(" to add one."),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(empty_msg, list_area);
    } else {
        let items = browser
            .items()
            .iter()
            .map(|flow| flow_item(flow, income_type_names, theme))
            .collect::<Vec<_>>();

        let mut list_state = ListState::default();
        list_state.select(Some(browser.selected));

        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("» ");
        frame.render_stateful_widget(list, list_area, &mut list_state);
    }

    let pagination = browser.pagination();
    let mut pager = vec![
        Span::styled(
            if pagination.has_previous() { "‹ " } else { "  " },
            Style::default().fg(theme.accent),
        ),
        Span::raw(format!(
            "page {} of {}",
            pagination.page(),
            pagination.total_pages().max(1)
        )),
        Span::styled(
            if pagination.has_next() { " ›" } else { "  " },
            Style::default().fg(theme.accent),
        ),
    ];
    if flows.view.is_pending() {
        pager.push(Span::styled("  filtering...", Style::default().fg(theme.text_muted)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(pager)).alignment(Alignment::Center),
        layout[2],
    );
}

fn flow_item(flow: &MoneyFlow, income_type_names: &[String], theme: &Theme) -> ListItem<'static> {
    let class = FlowClass::of(flow, income_type_names);
    ListItem::new(Line::from(vec![
        Span::styled(
            flow.created_at.format(DATE_FORMAT).to_string(),
            Style::default().fg(theme.text_muted),
        ),
        Span::raw(format!(
            "  {:<12} {:<10} {:<14} {:<14} ",
            name_or_missing(flow.status.as_ref()),
            name_or_missing(flow.flow_type.as_ref()),
            name_or_missing(flow.category.as_ref()),
            name_or_missing(flow.subcategory.as_ref()),
        )),
        styled_amount(flow.amount, class, theme),
        Span::styled(
            format!("  {}", flow.comment),
            Style::default().fg(theme.text_muted),
        ),
    ]))
}

fn render_filters(frame: &mut Frame<'_>, area: Rect, flows: &FlowsState, theme: &Theme) {
    let view = &flows.view;
    let card = Card::new("Filters", theme)
        .focused(view.editing)
        .error(view.error());
    let inner = card.inner(area);
    card.render_frame(frame, area);

    let mut spans = Vec::new();
    for (index, field) in FilterField::ALL.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw("  "));
        }
        let focused = view.editing && view.focused() == *field;
        let value = view.value(*field);
        spans.push(Span::styled(
            format!("{}: ", field.label()),
            Style::default().fg(theme.text_muted),
        ));
        let value_style = if focused {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.text)
        };
        let shown = if value.is_empty() && !focused {
            if field.is_date() { "yyyy-mm-dd" } else { "any" }
        } else {
            value
        };
        let cursor = if focused { "│" } else { "" };
        spans.push(Span::styled(format!("{shown}{cursor}"), value_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_detail(
    frame: &mut Frame<'_>,
    area: Rect,
    detail: &FlowDetailState,
    income_type_names: &[String],
    theme: &Theme,
) {
    let title = format!("Money flow #{}", detail.id());
    let card = Card::new(&title, theme).focused(true);

    let Some(flow) = detail.flow() else {
        let text = detail.error().unwrap_or("loading...");
        card.render_with(
            frame,
            area,
            Paragraph::new(error_line(Some(text), theme)).alignment(Alignment::Center),
        );
        return;
    };

    let class = FlowClass::of(flow, income_type_names);
    let class_label = match class {
        FlowClass::Income => Span::styled("income", Style::default().fg(theme.positive)),
        FlowClass::Expense => Span::styled("expense", Style::default().fg(theme.negative)),
    };
    let row = |label: &'static str, value: Span<'static>| {
        Line::from(vec![
            Span::styled(format!("{label:<12}"), Style::default().fg(theme.text_muted)),
            value,
        ])
    };
    let text = |value: &str| Span::styled(value.to_string(), Style::default().fg(theme.text));

    let mut lines = vec![
        row("Date", text(&flow.created_at.format(DATE_FORMAT).to_string())),
        row("Status", text(name_or_missing(flow.status.as_ref()))),
        row("Type", text(name_or_missing(flow.flow_type.as_ref()))),
        row("Category", text(name_or_missing(flow.category.as_ref()))),
        row("Subcategory", text(name_or_missing(flow.subcategory.as_ref()))),
        row("Amount", styled_amount(flow.amount, class, theme)),
        row("Kind", class_label),
        row("Comment", text(&flow.comment)),
        Line::default(),
    ];
    lines.push(error_line(detail.error(), theme));
    card.render_with(frame, area, Paragraph::new(lines));
}

fn render_form(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    form: &MoneyFlowForm,
    data: &ReferenceData,
    error: Option<&str>,
    theme: &Theme,
) {
    let card = Card::new(title, theme).focused(true);
    let inner = card.inner(area);
    card.render_frame(frame, area);

    let mut constraints = vec![Constraint::Length(1); FLOW_FIELDS.len()];
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(inner);

    for (index, field) in FLOW_FIELDS.iter().enumerate() {
        let focused = index == form.focus();
        let mut value = form.display(data, field);
        if focused && matches!(field.input, FlowInput::Select(_)) {
            value = format!("‹ {value} ›");
        }
        let row = InputRow {
            label: field.label,
            value: &value,
            secret: false,
            focused,
            error: form.form().error(field.name),
        };
        row.render(frame, rows[index], 12, theme);
    }

    frame.render_widget(
        Paragraph::new(error_line(error, theme)),
        rows[FLOW_FIELDS.len() + 1],
    );
}
