use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use rust_decimal::Decimal;

use crate::fmt::money;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const WARN_STYLE: Style = Style::new().fg(Color::Yellow);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

/// Format an amount as a colored Span (red for credits/refunds).
pub fn money_span(amount: Decimal) -> Span<'static> {
    let style = if amount.is_sign_negative() {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(money(amount), style)
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_counts_lines() {
        let (wrapped, lines) = wrap_text("one two three four five", 9);
        assert!(lines > 1);
        assert_eq!(wrapped.lines().count() as u16, lines);
    }

    #[test]
    fn test_wrap_text_zero_width_passthrough() {
        let (wrapped, lines) = wrap_text("hello", 0);
        assert_eq!(wrapped, "hello");
        assert_eq!(lines, 1);
    }
}
