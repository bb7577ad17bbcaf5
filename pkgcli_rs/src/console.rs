//! Console abstraction for command output.
//!
//! Commands never print directly; they go through [`Console`] so verbosity
//! is honoured in one place and tests can capture everything that was
//! written.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use console::{Term, style};

use crate::types::Verbosity;

/// Sink for everything a command shows to the user.
pub trait Console: Send + Sync {
    /// Write a line to standard output, regardless of verbosity.
    fn write_out(&self, text: &str);

    /// Write a line to the error stream, regardless of verbosity.
    fn write_err(&self, text: &str);

    fn verbosity(&self) -> Verbosity;

    fn set_verbosity(&self, verbosity: Verbosity);

    /// Whether prompts may be shown at all.
    fn is_interactive(&self) -> bool;

    fn set_interactive(&self, interactive: bool);

    /// Read one line of user input. `None` when input is closed.
    fn read_line(&self) -> Option<String>;

    /// Requested data (help text, a config value). Always shown.
    fn output(&self, text: &str) {
        self.write_out(text);
    }

    /// Progress and status text, hidden when quiet.
    fn info(&self, text: &str) {
        if self.verbosity() > Verbosity::Quiet {
            self.write_out(text);
        }
    }

    /// Extra detail, shown only when detailed.
    fn detail(&self, text: &str) {
        if self.verbosity() >= Verbosity::Detailed {
            self.write_out(text);
        }
    }

    fn warning(&self, text: &str) {
        if self.verbosity() > Verbosity::Quiet {
            self.write_out(&format!("WARNING: {}", text));
        }
    }

    fn error(&self, text: &str) {
        self.write_err(text);
    }

    /// Ask a yes/no question. Non-interactive consoles answer no.
    fn confirm(&self, prompt: &str) -> bool {
        if !self.is_interactive() {
            return false;
        }
        self.write_out(&format!("{} [y/N] ", prompt));
        self.read_line()
            .map(|answer| matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false)
    }
}

/// Console bound to the process standard streams.
pub struct SystemConsole {
    verbosity: AtomicU8,
    interactive: AtomicBool,
}

impl SystemConsole {
    pub fn new() -> Self {
        Self {
            verbosity: AtomicU8::new(Verbosity::Normal.as_u8()),
            interactive: AtomicBool::new(Term::stdout().is_term()),
        }
    }
}

impl Default for SystemConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for SystemConsole {
    fn write_out(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", text);
    }

    fn write_err(&self, text: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", text);
    }

    fn verbosity(&self) -> Verbosity {
        Verbosity::from_u8(self.verbosity.load(Ordering::Relaxed))
    }

    fn set_verbosity(&self, verbosity: Verbosity) {
        self.verbosity.store(verbosity.as_u8(), Ordering::Relaxed);
    }

    fn is_interactive(&self) -> bool {
        self.interactive.load(Ordering::Relaxed)
    }

    fn set_interactive(&self, interactive: bool) {
        self.interactive.store(interactive, Ordering::Relaxed);
    }

    fn read_line(&self) -> Option<String> {
        Term::stdout().read_line().ok()
    }

    fn warning(&self, text: &str) {
        if self.verbosity() > Verbosity::Quiet {
            self.write_out(&format!("{} {}", style("WARNING:").yellow().bold(), text));
        }
    }

    fn error(&self, text: &str) {
        self.write_err(&style(text).red().for_stderr().to_string());
    }

    fn confirm(&self, prompt: &str) -> bool {
        if !self.is_interactive() {
            return false;
        }
        let term = Term::stdout();
        let _ = term.write_str(&format!("{} [y/N] ", prompt));
        term.read_line()
            .map(|answer| matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false)
    }
}

/// In-memory console that records output; used by tests and embedders.
pub struct BufferConsole {
    out: Mutex<String>,
    err: Mutex<String>,
    input: Mutex<VecDeque<String>>,
    verbosity: AtomicU8,
    interactive: AtomicBool,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(String::new()),
            err: Mutex::new(String::new()),
            input: Mutex::new(VecDeque::new()),
            verbosity: AtomicU8::new(Verbosity::Normal.as_u8()),
            interactive: AtomicBool::new(false),
        }
    }

    /// Queue answers for prompts and make the console interactive.
    pub fn with_input<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut input) = self.input.lock() {
            input.extend(lines.into_iter().map(Into::into));
        }
        self.interactive.store(true, Ordering::Relaxed);
        self
    }

    pub fn stdout(&self) -> String {
        self.out.lock().map(|out| out.clone()).unwrap_or_default()
    }

    pub fn stderr(&self) -> String {
        self.err.lock().map(|err| err.clone()).unwrap_or_default()
    }
}

impl Default for BufferConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for BufferConsole {
    fn write_out(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            out.push_str(text);
            out.push('\n');
        }
    }

    fn write_err(&self, text: &str) {
        if let Ok(mut err) = self.err.lock() {
            err.push_str(text);
            err.push('\n');
        }
    }

    fn verbosity(&self) -> Verbosity {
        Verbosity::from_u8(self.verbosity.load(Ordering::Relaxed))
    }

    fn set_verbosity(&self, verbosity: Verbosity) {
        self.verbosity.store(verbosity.as_u8(), Ordering::Relaxed);
    }

    fn is_interactive(&self) -> bool {
        self.interactive.load(Ordering::Relaxed)
    }

    fn set_interactive(&self, interactive: bool) {
        self.interactive.store(interactive, Ordering::Relaxed);
    }

    fn read_line(&self) -> Option<String> {
        self.input.lock().ok()?.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_suppresses_info_and_warnings() {
        let console = BufferConsole::new();
        console.set_verbosity(Verbosity::Quiet);
        console.info("restoring");
        console.warning("careful");
        console.detail("noise");
        assert!(console.stdout().is_empty());

        console.output("value");
        console.error("boom");
        assert_eq!(console.stdout(), "value\n");
        assert_eq!(console.stderr(), "boom\n");
    }

    #[test]
    fn test_detail_needs_detailed_verbosity() {
        let console = BufferConsole::new();
        console.detail("hidden");
        console.set_verbosity(Verbosity::Detailed);
        console.detail("shown");
        assert_eq!(console.stdout(), "shown\n");
    }

    #[test]
    fn test_confirm_reads_queued_answers() {
        let console = BufferConsole::new().with_input(["y", "no"]);
        assert!(console.confirm("Delete?"));
        assert!(!console.confirm("Delete?"));
        assert!(!console.confirm("Delete?"));
    }

    #[test]
    fn test_non_interactive_confirm_is_no() {
        let console = BufferConsole::new();
        assert!(!console.confirm("Delete?"));
        assert!(console.stdout().is_empty());
    }
}
