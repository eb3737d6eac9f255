//! Colorized record formatting.
//!
//! A template mixes record fields (`{asctime}`, `{name}`, `{levelname}`,
//! `{message}`) with style tokens (`$RESET`, `$BOLD`, `$COLOR`, `$RED`,
//! `$BG-RED`, ...). Substitution is a single left-to-right pass over the
//! template, so text coming from the record is never re-scanned for tokens.
//! Unknown tokens are left as written.

use crate::logging::{LogRecord, Severity};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

/// The eight base terminal colors, in ANSI order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];

    fn offset(self) -> u8 {
        self as u8
    }

    /// Template token name, e.g. `RED`.
    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "BLACK",
            Color::Red => "RED",
            Color::Green => "GREEN",
            Color::Yellow => "YELLOW",
            Color::Blue => "BLUE",
            Color::Magenta => "MAGENTA",
            Color::Cyan => "CYAN",
            Color::White => "WHITE",
        }
    }

    pub fn foreground(self) -> String {
        format!("\x1b[{}m", 30 + self.offset())
    }

    pub fn background(self) -> String {
        format!("\x1b[{}m", 40 + self.offset())
    }
}

/// Fixed severity-to-color table.
pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Debug => Color::Blue,
        Severity::Info => Color::White,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
        Severity::Critical => Color::Magenta,
    }
}

/// Escape sequence for a style token name (without the leading `$`).
fn style_token(token: &str, severity: Severity) -> Option<String> {
    match token {
        "RESET" => return Some(RESET.to_string()),
        "BOLD" => return Some(BOLD.to_string()),
        "COLOR" => return Some(severity_color(severity).foreground()),
        _ => {}
    }
    if let Some(name) = token.strip_prefix("BG-") {
        return Color::ALL.iter().find(|c| c.name() == name).map(|c| c.background());
    }
    Color::ALL.iter().find(|c| c.name() == token).map(|c| c.foreground())
}

fn field_token(token: &str, record: &LogRecord) -> Option<String> {
    match token {
        "asctime" => Some(record.asctime()),
        "name" => Some(record.name.clone()),
        "levelname" => Some(record.severity.as_str().to_string()),
        "message" => Some(record.message.clone()),
        _ => None,
    }
}

fn expand(template: &str, record: &LogRecord, styled: bool) -> String {
    let mut out = String::with_capacity(template.len() + record.message.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '$']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        let replaced = if let Some(inner) = tail.strip_prefix('{') {
            inner.find('}').and_then(|end| {
                field_token(&inner[..end], record).map(|value| (value, end + 2))
            })
        } else {
            let name_len = tail[1..]
                .find(|c: char| !(c.is_ascii_uppercase() || c == '-'))
                .unwrap_or(tail.len() - 1);
            style_token(&tail[1..1 + name_len], record.severity)
                .map(|value| (if styled { value } else { String::new() }, name_len + 1))
        };

        match replaced {
            Some((value, consumed)) => {
                out.push_str(&value);
                rest = &tail[consumed..];
            }
            None => {
                out.push_str(&tail[..1]);
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Render a record through a styled template, always ending with a reset.
pub fn render(record: &LogRecord, template: &str) -> String {
    let mut out = expand(template, record, true);
    out.push_str(RESET);
    out
}

/// Expand the record fields and drop the style tokens.
pub fn format_plain(record: &LogRecord, template: &str) -> String {
    expand(template, record, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(severity: Severity, message: &str) -> LogRecord {
        LogRecord::new(severity, "jobs", message)
    }

    #[test]
    fn test_no_tokens_appends_reset() {
        let rec = record(Severity::Error, "ignored");
        assert_eq!(render(&rec, "plain text"), format!("plain text{}", RESET));
    }

    #[test]
    fn test_message_only_template() {
        let rec = record(Severity::Info, "echo hi");
        assert_eq!(render(&rec, "{message}"), format!("echo hi{}", RESET));
    }

    #[test]
    fn test_reset_and_bold() {
        let rec = record(Severity::Info, "m");
        assert_eq!(render(&rec, "$BOLD{message}$RESET"), "\x1b[1mm\x1b[0m\x1b[0m");
    }

    #[test]
    fn test_color_follows_severity() {
        assert_eq!(render(&record(Severity::Error, "x"), "$COLOR"), "\x1b[31m\x1b[0m");
        assert_eq!(render(&record(Severity::Warning, "x"), "$COLOR"), "\x1b[33m\x1b[0m");
        assert_eq!(render(&record(Severity::Debug, "x"), "$COLOR"), "\x1b[34m\x1b[0m");
        assert_eq!(render(&record(Severity::Critical, "x"), "$COLOR"), "\x1b[35m\x1b[0m");
        assert_eq!(render(&record(Severity::Info, "x"), "$COLOR"), "\x1b[37m\x1b[0m");
    }

    #[test]
    fn test_named_colors_and_backgrounds() {
        let rec = record(Severity::Info, "x");
        assert_eq!(render(&rec, "$GREEN"), "\x1b[32m\x1b[0m");
        assert_eq!(render(&rec, "$BG-GREEN"), "\x1b[42m\x1b[0m");
        assert_eq!(render(&rec, "$BLACK$BG-WHITE"), "\x1b[30m\x1b[47m\x1b[0m");
    }

    #[test]
    fn test_unknown_tokens_left_alone() {
        let rec = record(Severity::Info, "x");
        assert_eq!(render(&rec, "$PURPLE {nope} $"), format!("$PURPLE {{nope}} ${}", RESET));
    }

    #[test]
    fn test_message_text_not_rescanned() {
        let rec = record(Severity::Error, "echo $RED {name}");
        assert_eq!(render(&rec, "{message}"), format!("echo $RED {{name}}{}", RESET));
    }

    #[test]
    fn test_fields_expanded() {
        let rec = record(Severity::Warning, "disk low");
        let out = format_plain(&rec, "{name} - {levelname} - {message}");
        assert_eq!(out, "jobs - WARNING - disk low");
    }

    #[test]
    fn test_format_plain_strips_style_tokens() {
        let rec = record(Severity::Error, "false");
        assert_eq!(format_plain(&rec, "$COLOR$BOLD{message}$RESET"), "false");
        assert_eq!(format_plain(&rec, "$NOPE {message}"), "$NOPE false");
    }

    #[test]
    fn test_render_is_deterministic() {
        let rec = record(Severity::Error, "false");
        let template = "$COLOR$BOLD{levelname}$RESET {message}";
        assert_eq!(render(&rec, template), render(&rec, template));
        assert_eq!(render(&rec, template), "\x1b[31m\x1b[1mERROR\x1b[0m false\x1b[0m");
    }
}
