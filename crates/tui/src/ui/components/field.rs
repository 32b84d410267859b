use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::ui::theme::Theme;

/// One labelled input row: `label  value│  error`.
pub struct InputRow<'a> {
    pub label: &'a str,
    pub value: &'a str,
    pub secret: bool,
    pub focused: bool,
    pub error: Option<&'a str>,
}

impl InputRow<'_> {
    pub fn line(&self, label_width: usize, theme: &Theme) -> Line<'static> {
        let cursor = if self.focused { "│" } else { "" };
        let value = if self.secret {
            mask_password(self.value)
        } else {
            self.value.replace('\n', "⏎")
        };
        let value_style = if self.focused {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.text)
        };

        let mut spans = vec![
            Span::styled(
                format!("{:<label_width$}  ", self.label),
                Style::default().fg(theme.text_muted),
            ),
            Span::styled(format!("{value}{cursor}"), value_style),
        ];
        if let Some(error) = self.error {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(error.to_string(), Style::default().fg(theme.error)));
        }
        Line::from(spans)
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, label_width: usize, theme: &Theme) {
        frame.render_widget(Paragraph::new(self.line(label_width, theme)), area);
    }
}

/// Masks password with bullets, one per character
fn mask_password(password: &str) -> String {
    "•".repeat(password.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_values_are_masked() {
        let theme = Theme::default();
        let row = InputRow {
            label: "Password",
            value: "hunter2",
            secret: true,
            focused: false,
            error: None,
        };
        let text: String = row
            .line(8, &theme)
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        assert_eq!(text, "Password  •••••••");
    }
}
