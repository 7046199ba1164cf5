//! REPL slash-commands
//!
//! Command failures are reported on the console and never end the session;
//! only `/quit` and `/reset` change its course.

use crate::config;
use crate::conversations::ConversationClient;
use whisper_profile_core::{Console, Profile, Transport};

/// What the session loop should do after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Reset,
    Quit,
}

/// Handle one line of user input
pub fn process_line<T: Transport, C: Console>(
    line: &str,
    profile: &Profile,
    transport: &T,
    console: &mut C,
) -> LineOutcome {
    let line = line.trim();
    let Some(command_line) = line.strip_prefix('/') else {
        // Plain text is the conversation itself; nothing to send yet
        return LineOutcome::Continue;
    };

    let (cmd, rest) = command_line.split_once(' ').unwrap_or((command_line, ""));
    let cmd = cmd.to_lowercase();
    let rest = rest.trim();

    match cmd.as_str() {
        "" => console.print("> No command specified; type '/help' for help"),
        "reset" => return LineOutcome::Reset,
        "quit" | "exit" => return LineOutcome::Quit,
        "help" => print_help(console),
        "wc" => list_conversations(profile, transport, console),
        "nwc" => new_conversation(profile, transport, console, rest),
        "iwc" => show_conversation_id(profile, transport, console, rest),
        "dwc" => delete_conversation(profile, transport, console, rest),
        other => console.print(&format!("> Unknown command: {}\n> Type '/help' for help", other)),
    }

    LineOutcome::Continue
}

fn print_help<C: Console>(console: &mut C) {
    console.print(&format!("> {} commands:", config::app_name()));
    console.print("> /help: show this help");
    console.print("> /reset: restart the program, removing your stored profile");
    console.print("> /wc: show whisper conversations");
    console.print("> /nwc <name>: new whisper conversation");
    console.print("> /iwc <name>: show the id of a whisper conversation");
    console.print("> /dwc <name>: delete a whisper conversation");
    console.print("> /quit: exit the program");
}

fn require_name<C: Console>(console: &mut C, name: &str) -> bool {
    if name.is_empty() {
        console.print("> Please give a conversation name");
        return false;
    }
    true
}

fn list_conversations<T: Transport, C: Console>(profile: &Profile, transport: &T, console: &mut C) {
    match ConversationClient::new(transport, profile).list() {
        Ok(conversations) if conversations.is_empty() => {
            console.print("> No whisper conversations found.")
        }
        Ok(conversations) => {
            console.print("> Whisper conversations:");
            for (name, id) in &conversations {
                console.print(&format!(">     {}: {}", name, id));
            }
        }
        Err(e) => console.print(&format!("> Error getting whisper conversations: {}", e)),
    }
}

fn new_conversation<T: Transport, C: Console>(
    profile: &Profile,
    transport: &T,
    console: &mut C,
    name: &str,
) {
    if !require_name(console, name) {
        return;
    }
    match ConversationClient::new(transport, profile).create(name) {
        Ok(id) => {
            console.print("> New whisper conversation:");
            console.print(&format!(">     {}: {}", name, id));
        }
        Err(e) => console.print(&format!("> Error creating whisper conversation: {}", e)),
    }
}

fn show_conversation_id<T: Transport, C: Console>(
    profile: &Profile,
    transport: &T,
    console: &mut C,
    name: &str,
) {
    if !require_name(console, name) {
        return;
    }
    match ConversationClient::new(transport, profile).find_id(name) {
        Ok(Some(id)) => console.print(&format!("> Whisper conversation {:?} has id {}", name, id)),
        Ok(None) => console.print(&format!("> No whisper conversation named {:?}", name)),
        Err(e) => console.print(&format!("> Error getting whisper conversation: {}", e)),
    }
}

fn delete_conversation<T: Transport, C: Console>(
    profile: &Profile,
    transport: &T,
    console: &mut C,
    name: &str,
) {
    if !require_name(console, name) {
        return;
    }
    match ConversationClient::new(transport, profile).delete(name) {
        Ok(Some(_)) => console.print(&format!("> Deleted whisper conversation: {}", name)),
        Ok(None) => console.print(&format!("> No whisper conversation named {:?}", name)),
        Err(e) => console.print(&format!("> Error deleting whisper conversation: {}", e)),
    }
}
