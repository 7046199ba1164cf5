//! Line-oriented console seam used by the collector
//!
//! The terminal implementation lives in the binary; tests drive the
//! negotiation with a scripted console instead.

/// Input stream ended or was interrupted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputClosed(pub String);

impl std::fmt::Display for InputClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "input closed: {}", self.0)
    }
}

impl std::error::Error for InputClosed {}

pub trait Console {
    /// Read one line, without the trailing newline
    fn read_line(&mut self) -> Result<String, InputClosed>;

    /// Read a secret; terminals should not echo it
    fn read_secret(&mut self) -> Result<String, InputClosed> {
        self.read_line()
    }

    /// Show a prompt (no newline)
    fn prompt(&mut self, text: &str);

    /// Print a full line
    fn print(&mut self, line: &str);
}

impl<C: Console + ?Sized> Console for &mut C {
    fn read_line(&mut self) -> Result<String, InputClosed> {
        (**self).read_line()
    }

    fn read_secret(&mut self) -> Result<String, InputClosed> {
        (**self).read_secret()
    }

    fn prompt(&mut self, text: &str) {
        (**self).prompt(text)
    }

    fn print(&mut self, line: &str) {
        (**self).print(line)
    }
}

/// Console fed from a fixed script, recording everything shown
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    input: std::collections::VecDeque<String>,
    pub transcript: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    pub fn output(&self) -> String {
        self.transcript.join("\n")
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self) -> Result<String, InputClosed> {
        self.input
            .pop_front()
            .ok_or_else(|| InputClosed("end of script".to_string()))
    }

    fn prompt(&mut self, text: &str) {
        self.transcript.push(text.to_string());
    }

    fn print(&mut self, line: &str) {
        self.transcript.push(line.to_string());
    }
}
