use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::Frame;

use crate::error::Result;
use crate::fmt::number;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

/// Format a value as a colored Span: green when non-negative, red otherwise.
pub fn value_span(value: f64) -> Span<'static> {
    let style = if value < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(number(value), style)
}

/// Shorten `text` to `width` columns, ending in an ellipsis when cut.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('\u{2026}');
    out
}

pub enum ReportViewAction {
    Continue,
    Close,
}

pub trait ReportView {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction;
}

/// Block until the next key press. `None` means the user asked to quit with Ctrl-C.
fn next_key() -> Result<Option<KeyCode>> {
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return Ok(None);
            }
            return Ok(Some(key.code));
        }
    }
}

/// Take over the terminal and drive `view` until it closes. The terminal is
/// restored on every exit path, panics included.
pub fn run_report_view(view: &mut dyn ReportView) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    tracing::debug!("entered interactive view");

    let result = (|| -> Result<()> {
        loop {
            terminal.draw(|frame| view.draw(frame))?;
            let Some(code) = next_key()? else {
                return Ok(());
            };
            if let ReportViewAction::Close = view.handle_key(code) {
                return Ok(());
            }
        }
    })();

    drop(terminal);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Beverages / Soda", 40), "Beverages / Soda");
        assert_eq!(truncate("Beverages / Soda", 6), "Bever\u{2026}");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn test_value_span_colors_by_sign() {
        assert_eq!(value_span(-5.0).style, AMOUNT_NEG_STYLE);
        assert_eq!(value_span(5.0).style, AMOUNT_POS_STYLE);
        assert_eq!(value_span(1234.5).content, "1,234.50");
    }
}
