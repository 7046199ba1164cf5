//! Interactive Collector
//!
//! Prompts for the profile email and password. Bad input re-prompts and never
//! leaves this module as an error; only quitting (or closed input) does.

use crate::console::Console;
use crate::error::ProfileError;
use regex::Regex;
use uuid::Uuid;

lazy_static::lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[-a-z0-9.]+@[-a-z0-9.]+$").unwrap();
}

const INTERRUPTED: &str = "Interrupt received!";
const QUIT: &str = "Quit!";

/// Outcome of one password collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordEntry {
    /// A UUID-shaped secret, trimmed as typed
    Secret(String),
    /// User wants to use a different email
    ChangeEmail,
    /// User wants the password mailed to them
    RequestReset,
}

fn is_quit(word: &str) -> bool {
    word == "quit" || word == "exit"
}

/// True if `input` (already trimmed and lowercased) looks like an email
pub fn is_valid_email(input: &str) -> bool {
    EMAIL_RE.is_match(input)
}

/// True if `input` parses as a UUID-shaped secret
pub fn is_valid_secret(input: &str) -> bool {
    Uuid::parse_str(input).is_ok()
}

/// Collect the profile email
///
/// Returns the trimmed, lowercased address.
pub fn collect_email<C: Console>(console: &mut C) -> Result<String, ProfileError> {
    console.print("Welcome to Whisper! Let's get you set up on this device.");
    loop {
        console.prompt("Enter your email address (or 'help' for help): ");
        let email = console
            .read_line()
            .map_err(|_| ProfileError::Aborted(INTERRUPTED.to_string()))?
            .trim()
            .to_lowercase();

        if email.is_empty() {
            console.print("Sorry, you must enter an email, or 'help' for help.");
            continue;
        }
        if email == "help" {
            console.print("Every user's profile is tied to their email address.");
            console.print("If you don't already have a profile, one will be created for you.");
            console.print(
                "If you already have a profile, you'll enter your password to use it on this device.",
            );
            console.print("If you don't want to continue now, enter 'quit' to quit.");
            continue;
        }
        if is_quit(&email) {
            return Err(ProfileError::Aborted(QUIT.to_string()));
        }
        if is_valid_email(&email) {
            return Ok(email);
        }
        console.print("Sorry, that doesn't look like a valid email address.");
    }
}

/// Collect the profile password
///
/// `retry` means the previous password was rejected by the server.
pub fn collect_password<C: Console>(
    console: &mut C,
    retry: bool,
) -> Result<PasswordEntry, ProfileError> {
    if retry {
        console.print("Sorry, wrong password. Please try again.");
    }
    loop {
        console.prompt("Enter your password (or 'help' for help): ");
        let raw = console
            .read_secret()
            .map_err(|_| ProfileError::Aborted(INTERRUPTED.to_string()))?;
        let password = raw.trim();
        let word = password.to_lowercase();

        if password.is_empty() {
            console.print("Sorry, you must enter a password, or 'help' for help.");
            continue;
        }
        match word.as_str() {
            "help" => {
                console.print("Enter the password you were shown when you registered your account.");
                console.print("If you forgot your password, enter 'email' to have it mailed to you.");
                console.print("To use a different email address, enter 'change'.");
                console.print("If you don't want to continue now, enter 'quit' to quit.");
                continue;
            }
            "change" => return Ok(PasswordEntry::ChangeEmail),
            "email" => return Ok(PasswordEntry::RequestReset),
            w if is_quit(w) => return Err(ProfileError::Aborted(QUIT.to_string())),
            _ => {}
        }
        if is_valid_secret(password) {
            return Ok(PasswordEntry::Secret(password.to_string()));
        }
        console.print("Sorry, that isn't a valid password. Passwords look like 8-4-4-4-12 hex digits.");
    }
}
