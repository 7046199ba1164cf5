//! Whisper Console - Entry Point
//!
//! # Startup Order
//!
//! 1. Load `.env.local` and initialize tracing (stderr)
//! 2. Resolve configuration (baked defaults + environment)
//! 3. Ensure an authorized profile: load, negotiate, persist
//! 4. Run the REPL until `/quit` or end of input
//!
//! `/reset` deletes the stored profile and goes back to step 3.

mod commands;
mod config;
mod conversations;
mod terminal;

use commands::{process_line, LineOutcome};
use config::ClientConfig;
use std::io;
use std::process::ExitCode;
use terminal::TerminalConsole;
use whisper_profile_core::startup::ensure_profile;
use whisper_profile_core::{Console, HttpTransport, Negotiator, ProfileError, ProfileStore, Transport};

fn main() -> ExitCode {
    if dotenvy::from_filename(".env.local").is_err() {
        let _ = dotenvy::from_filename("../.env.local");
    }

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("whisper_console=warn".parse().unwrap())
                .add_directive("whisper_profile_core=warn".parse().unwrap()),
        )
        .with_target(true)
        .init();

    let config = ClientConfig::from_env();

    tracing::info!(
        op = "console.startup",
        app = config::app_slug(),
        api_root = %config.api_root,
        profile_path = %config.profile_path.display(),
        "Whisper console starting"
    );

    let transport = match HttpTransport::new(&config.api_root, config.request_timeout) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("> {}", e);
            return ExitCode::FAILURE;
        }
    };
    let store = ProfileStore::new(&config.profile_path);
    let mut negotiator = Negotiator::new(&transport, TerminalConsole::new());

    match run_session(&store, &mut negotiator) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_aborted() => {
            println!("{}", e);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(op = "console.fatal", error = %e, "Session ended with an error");
            eprintln!("> Couldn't continue: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Negotiate a profile, then serve the REPL until the user leaves
fn run_session<T: Transport, C: Console>(
    store: &ProfileStore,
    negotiator: &mut Negotiator<T, C>,
) -> Result<(), ProfileError> {
    loop {
        let profile = ensure_profile(store, negotiator)?.profile;
        negotiator.console_mut().print(&format!(
            "> Loaded profile ID {} for user {}",
            profile.profile_id, profile.profile_email
        ));

        loop {
            let (transport, console) = negotiator.split();
            let Ok(line) = console.read_line() else {
                tracing::info!(op = "console.input_closed", "Input closed, exiting");
                return Ok(());
            };

            match process_line(&line, &profile, transport, console) {
                LineOutcome::Continue => continue,
                LineOutcome::Quit => return Ok(()),
                LineOutcome::Reset => {
                    store
                        .delete()
                        .map_err(|e| ProfileError::Storage(e.to_string()))?;
                    tracing::info!(op = "console.reset", "Stored profile removed by user");
                    break;
                }
            }
        }
    }
}
