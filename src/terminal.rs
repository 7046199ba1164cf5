//! Terminal console
//!
//! Prompts go to stdout. Passwords are read without echo when stdin is a
//! terminal, and as a plain line otherwise (piped input, tests).

use std::io::{self, BufRead, IsTerminal, Write};
use whisper_profile_core::{Console, InputClosed};

pub struct TerminalConsole {
    stdin: io::Stdin,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self { stdin: io::stdin() }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TerminalConsole {
    fn read_line(&mut self) -> Result<String, InputClosed> {
        let mut line = String::new();
        match self.stdin.lock().read_line(&mut line) {
            Ok(0) => Err(InputClosed("end of input".to_string())),
            Ok(_) => Ok(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => Err(InputClosed(e.to_string())),
        }
    }

    fn read_secret(&mut self) -> Result<String, InputClosed> {
        if !self.stdin.is_terminal() {
            return self.read_line();
        }
        rpassword::read_password().map_err(|e| InputClosed(e.to_string()))
    }

    fn prompt(&mut self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn print(&mut self, line: &str) {
        println!("{}", line);
    }
}
