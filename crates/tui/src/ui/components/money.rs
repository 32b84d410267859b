use api_types::Amount;
use ratatui::{style::Style, text::Span};

use crate::{app::money_flow::detail::FlowClass, ui::theme::Theme};

/// Amount colored by whether the flow is income or expense.
#[must_use]
pub fn styled_amount(amount: Amount, class: FlowClass, theme: &Theme) -> Span<'static> {
    let (color, prefix) = match class {
        FlowClass::Income => (theme.positive, "+"),
        FlowClass::Expense => (theme.negative, "-"),
    };
    let amount = Amount::new(amount.cents().abs());
    Span::styled(format!("{prefix}{amount}"), Style::default().fg(color))
}
