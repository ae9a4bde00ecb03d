//! The interpreter's view of the outside world: where `print` output goes and
//! where `Input` reads lines from.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Destination for program output and flushed diagnostics.
pub trait Output {
    /// One line of program output (`print` statement).
    fn print(&self, text: &str);

    /// One block of diagnostic text.
    fn print_error(&self, text: &str);

    /// Text shown before reading input; no line break is implied.
    fn prompt(&self, text: &str) {
        self.print(text);
    }
}

/// Source of input lines for the `Input` builtin.
pub trait LineSource {
    /// Next line without its terminator, or `None` at end of input.
    fn read_line(&self) -> io::Result<Option<String>>;
}

/// Writes to the process's stdout/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdOutput;

impl Output for StdOutput {
    fn print(&self, text: &str) {
        println!("{}", text);
    }

    fn print_error(&self, text: &str) {
        eprintln!("{}", text);
    }

    fn prompt(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{}", text).and_then(|_| stdout.flush());
    }
}

/// Captures everything in memory; used by tests and embedders.
#[derive(Debug, Default)]
pub struct BufferedOutput {
    lines: RefCell<Vec<String>>,
    errors: RefCell<Vec<String>>,
    prompts: RefCell<Vec<String>>,
}

impl BufferedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Output for BufferedOutput {
    fn print(&self, text: &str) {
        self.lines.borrow_mut().push(text.to_string());
    }

    fn print_error(&self, text: &str) {
        self.errors.borrow_mut().push(text.to_string());
    }

    fn prompt(&self, text: &str) {
        self.prompts.borrow_mut().push(text.to_string());
    }
}

/// Reads from the process's stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinSource;

impl LineSource for StdinSource {
    fn read_line(&self) -> io::Result<Option<String>> {
        let mut line: String = String::new();

        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let trimmed_len: usize = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);

        Ok(Some(line))
    }
}

/// Hands out a fixed list of lines, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: RefCell<VecDeque<String>>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: RefCell::new(lines.into_iter().map(Into::into).collect()),
        }
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&self) -> io::Result<Option<String>> {
        Ok(self.lines.borrow_mut().pop_front())
    }
}
