//! User-facing progress output.
//!
//! The orchestrator never prints directly. It emits lines through a
//! [`Reporter`] at a [`Verbosity`]; the reporter decides what reaches the
//! user. Diagnostics for operators go through `tracing` instead.

use std::io::Write;
use std::time::Duration;

use colored::Colorize;
use pingu_core::Status;
use tracing::debug;

use crate::assertion::{Assert, Assertion, AssertionResult};

/// How much progress output to show. Each level includes the ones before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Check results and errors only.
    #[default]
    Normal,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    /// Map a repeated `-v` flag count onto a level.
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Verbosity::Normal,
            1 => Verbosity::Info,
            2 => Verbosity::Debug,
            _ => Verbosity::Trace,
        }
    }
}

fn status_token(status: Status) -> String {
    match status {
        Status::Pass => status.as_str().green().to_string(),
        Status::Fail => status.as_str().red().to_string(),
    }
}

pub trait Reporter {
    /// Emit one line at `level`.
    fn emit(&mut self, level: Verbosity, line: &str);

    /// Nest subsequent lines one level deeper.
    fn indent(&mut self) {}

    fn dedent(&mut self) {}

    fn suppressed(&mut self, url: &str, window: &str) {
        self.emit(
            Verbosity::Info,
            &format!("{} {} ({url})", "Ignore time period:".red(), window.yellow()),
        );
        self.emit(Verbosity::Info, &"Current period is active. Skipping check.".red().to_string());
    }

    fn fetching(&mut self, url: &str) {
        self.emit(Verbosity::Trace, &format!("Fetching url: {url}"));
    }

    fn fetch_failed(&mut self, url: &str, reason: &str) {
        self.emit(Verbosity::Trace, &format!("Failed to fetch {url}: {reason}"));
    }

    fn assertion(&mut self, assertion: &Assertion, result: &AssertionResult) {
        let status = if result.passed { Status::Pass } else { Status::Fail };
        let detail = if result.message.is_empty() {
            String::new()
        } else {
            format!(": {}", result.message)
        };
        self.emit(
            Verbosity::Trace,
            &format!("{} {}{detail}", assertion.name(), status_token(status)),
        );
    }

    fn retry(&mut self, attempt: u32, wait: Duration) {
        self.emit(
            Verbosity::Debug,
            &format!("Retry #{attempt} in {} seconds...", wait.as_secs()).green().to_string(),
        );
    }

    fn passed(&mut self, url: &str) {
        self.emit(Verbosity::Normal, &format!("{} GET {url}", status_token(Status::Pass)));
    }

    fn failed(&mut self, url: &str, message: &str) {
        self.emit(Verbosity::Normal, &format!("{} GET {url}", status_token(Status::Fail)));
        self.indent();
        for part in message.split("; ") {
            self.emit(Verbosity::Normal, &format!("{}: {part}", status_token(Status::Fail)));
        }
        self.dedent();
    }
}

/// Writes lines at or below the configured verbosity, two spaces per indent.
pub struct ConsoleReporter<W: Write> {
    out: W,
    verbosity: Verbosity,
    depth: usize,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout(verbosity: Verbosity) -> Self {
        Self::new(std::io::stdout(), verbosity)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbosity: Verbosity) -> Self {
        Self {
            out,
            verbosity,
            depth: 0,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn emit(&mut self, level: Verbosity, line: &str) {
        if level > self.verbosity {
            return;
        }
        // A closed pipe must not fail the check.
        if let Err(e) = writeln!(self.out, "{}{line}", "  ".repeat(self.depth)) {
            debug!(error = %e, "console write failed");
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(reporter: ConsoleReporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn verbosity_from_count() {
        assert_eq!(Verbosity::from_count(0), Verbosity::Normal);
        assert_eq!(Verbosity::from_count(2), Verbosity::Debug);
        assert_eq!(Verbosity::from_count(9), Verbosity::Trace);
    }

    #[test]
    fn filters_by_level() {
        let mut reporter = ConsoleReporter::new(Vec::new(), Verbosity::Info);
        reporter.emit(Verbosity::Normal, "always");
        reporter.emit(Verbosity::Info, "info");
        reporter.emit(Verbosity::Debug, "debug");

        let text = output(reporter);
        assert!(text.contains("always"));
        assert!(text.contains("info"));
        assert!(!text.contains("debug"));
    }

    #[test]
    fn failure_lines_are_indented() {
        let mut reporter = ConsoleReporter::new(Vec::new(), Verbosity::Normal);
        reporter.failed("https://example.com", "could not fetch resource");

        let text = output(reporter);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("GET https://example.com"));
        assert!(lines[1].starts_with("  "));
        assert!(lines[1].contains("could not fetch resource"));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_do_not_panic() {
        let mut reporter = ConsoleReporter::new(ClosedPipe, Verbosity::Trace);
        reporter.passed("https://example.com");
        reporter.failed("https://example.com", "a; b");
        assert_eq!(reporter.verbosity(), Verbosity::Trace);
    }

    #[test]
    fn dedent_never_goes_negative() {
        let mut reporter = ConsoleReporter::new(Vec::new(), Verbosity::Normal);
        reporter.dedent();
        reporter.emit(Verbosity::Normal, "flush");
        assert_eq!(output(reporter), "flush\n");
    }
}
