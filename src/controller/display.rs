//! Live status display.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveToPreviousLine,
    queue,
    terminal::{self, Clear, ClearType},
};

/// A surface the controller redraws the status line on.
pub trait StatusDisplay: Send {
    /// Replace whatever was last shown with `message`.
    fn render(&mut self, message: &str) -> io::Result<()>;

    /// Called once after the final render.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Redraws the status block in place on a terminal.
///
/// Each render moves the cursor back over the previous block and clears to
/// the end of the screen before writing. A block taller than `max_lines`
/// keeps its first line and the most recent lines, since the cursor cannot
/// move back above the top of the screen. Lines wider than the terminal wrap
/// and are not accounted for.
pub struct TerminalDisplay<W: Write + Send> {
    out: W,
    lines: u16,
    max_lines: Option<usize>,
}

impl TerminalDisplay<io::Stderr> {
    /// Display on stderr, limited to the current terminal height.
    pub fn stderr() -> Self {
        let display = Self::new(io::stderr());
        match terminal::size() {
            // One row stays free for the cursor after the block.
            Ok((_, rows)) => display.with_max_lines(usize::from(rows).saturating_sub(1)),
            Err(_) => display,
        }
    }
}

impl<W: Write + Send> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            lines: 0,
            max_lines: None,
        }
    }

    /// Limit every rendered block to `max` lines
    pub fn with_max_lines(mut self, max: usize) -> Self {
        self.max_lines = Some(max.max(1));
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> StatusDisplay for TerminalDisplay<W> {
    fn render(&mut self, message: &str) -> io::Result<()> {
        let block = match self.max_lines {
            Some(max) => fit_lines(message, max),
            None => message.to_string(),
        };
        if self.lines > 0 {
            queue!(self.out, MoveToPreviousLine(self.lines))?;
        }
        queue!(self.out, Clear(ClearType::FromCursorDown))?;
        writeln!(self.out, "{}", block)?;
        self.out.flush()?;
        self.lines = u16::try_from(block.lines().count().max(1)).unwrap_or(u16::MAX);
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.lines = 0;
        self.out.flush()
    }
}

/// Keep the first line and the last `max - 1` lines of `message`.
fn fit_lines(message: &str, max: usize) -> String {
    let lines: Vec<&str> = message.lines().collect();
    if lines.len() <= max {
        return message.to_string();
    }
    let mut kept = vec![lines[0]];
    kept.extend_from_slice(&lines[lines.len() - (max - 1)..]);
    kept.join("\n")
}

/// Display used in quiet mode.
#[derive(Debug, Default)]
pub struct NoDisplay;

impl StatusDisplay for NoDisplay {
    fn render(&mut self, _message: &str) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(display: TerminalDisplay<Vec<u8>>) -> String {
        String::from_utf8(display.into_inner()).unwrap()
    }

    #[test]
    fn test_first_render_clears_and_writes() {
        let mut display = TerminalDisplay::new(Vec::new());
        display.render("0/3 jobs done").unwrap();
        let out = text(display);
        assert!(out.starts_with("\x1b[J"));
        assert!(out.ends_with("0/3 jobs done\n"));
    }

    #[test]
    fn test_rerender_moves_back_over_previous_block() {
        let mut display = TerminalDisplay::new(Vec::new());
        display.render("1/3 jobs done\n\nERROR false").unwrap();
        display.render("2/3 jobs done").unwrap();
        let out = text(display);
        assert!(out.contains("\x1b[3F"));
        assert!(out.ends_with("2/3 jobs done\n"));
    }

    #[test]
    fn test_finish_stops_rewinding() {
        let mut display = TerminalDisplay::new(Vec::new());
        display.render("3/3 jobs done").unwrap();
        display.finish().unwrap();
        display.render("next").unwrap();
        assert!(!text(display).contains("\x1b[1F"));
    }

    #[test]
    fn test_fit_lines_keeps_status_and_latest_errors() {
        let message = "5/9 jobs done\n\nERROR a\nERROR b\nERROR c";
        assert_eq!(fit_lines(message, 3), "5/9 jobs done\nERROR b\nERROR c");
        assert_eq!(fit_lines(message, 1), "5/9 jobs done");
        assert_eq!(fit_lines(message, 10), message);
    }

    #[test]
    fn test_tall_block_rewinds_only_what_was_drawn() {
        let mut display = TerminalDisplay::new(Vec::new()).with_max_lines(3);
        display.render("1/9 jobs done\n\nERROR a\nERROR b\nERROR c\nERROR d").unwrap();
        display.render("2/9 jobs done").unwrap();
        let out = text(display);
        assert!(out.contains("\x1b[3F"));
        assert!(!out.contains("\x1b[6F"));
        assert!(!out.contains("ERROR b"));
        assert!(out.contains("ERROR d"));
    }
}
