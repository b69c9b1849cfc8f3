//! Status lines for the terminal.

use console::{Style, Term};

/// Writes run summaries, skipped records and failures to stderr.
///
/// Stdout carries the rewritten HTML or JSON lines, so nothing here touches it.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
        }
    }

    /// Plain status line, e.g. the run directory name.
    pub(crate) fn info(&self, msg: &str) {
        self.line(msg, None);
    }

    /// Batch completed.
    pub(crate) fn success(&self, msg: &str) {
        self.line(msg, Some(&self.green));
    }

    /// A record was skipped.
    pub(crate) fn warning(&self, msg: &str) {
        self.line(msg, Some(&self.yellow));
    }

    /// The command failed.
    pub(crate) fn error(&self, msg: &str) {
        self.line(msg, Some(&self.red));
    }

    fn line(&self, msg: &str, style: Option<&Style>) {
        let text = match style {
            Some(style) => style.apply_to(msg).to_string(),
            None => msg.to_owned(),
        };
        // A closed stderr leaves nowhere to report to
        let _ = self.term.write_line(&text);
    }
}
