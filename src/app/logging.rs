//! Activity log types and key masking.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

/// Severity of a log line, mapped to a display colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn color(self) -> Color {
        match self {
            LogLevel::Info => Color::Reset,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }
}

/// One entry in the activity panel.
#[derive(Clone, Debug)]
pub struct LogLine {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogLine {
    /// Render the entry as a styled line: dim timestamp, coloured message.
    pub fn render(&self) -> Line<'_> {
        Line::from(vec![
            Span::styled(
                format!("{} ", self.timestamp),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(&self.message, Style::default().fg(self.level.color())),
        ])
    }
}

/// Mask an API key for display, keeping the first and last four characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_keys_are_fully_masked() {
        assert_eq!(mask_key("abc"), "***");
        assert_eq!(mask_key("12345678"), "********");
    }

    #[test]
    fn long_keys_keep_head_and_tail() {
        assert_eq!(mask_key("AIzaSyD-1234567890xyzw"), "AIza…xyzw");
    }

    #[test]
    fn masking_is_char_safe() {
        assert_eq!(mask_key("ключключключ"), "ключ…ключ");
    }
}
