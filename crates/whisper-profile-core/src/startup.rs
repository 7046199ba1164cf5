//! Startup orchestration
//!
//! Load the stored profile (or start a fresh one), negotiate it with the
//! server, then persist the authorized result.

use crate::console::Console;
use crate::error::ProfileError;
use crate::negotiator::{Negotiated, Negotiator};
use crate::profile::Profile;
use crate::profile_store::ProfileStore;
use crate::transport::Transport;

/// Ensure this device holds an authorized profile
///
/// The store is written exactly once, after the server has authorized the
/// profile. A newly created profile's password is shown here and nowhere else.
pub fn ensure_profile<T: Transport, C: Console>(
    store: &ProfileStore,
    negotiator: &mut Negotiator<T, C>,
) -> Result<Negotiated, ProfileError> {
    let stored = store
        .load()
        .map_err(|e| ProfileError::Storage(e.to_string()))?;

    let profile = match stored {
        Some(profile) => profile,
        None => {
            let profile = Profile::new();
            tracing::info!(
                op = "startup.new_client",
                client_id = %profile.client_id,
                "No stored profile, starting fresh"
            );
            profile
        }
    };

    let negotiated = negotiator.negotiate(profile)?;

    store
        .save(&negotiated.profile)
        .map_err(|e| ProfileError::Storage(e.to_string()))?;

    if negotiated.created {
        let console = negotiator.console_mut();
        console.print(&format!(
            "A profile has been created for your email: {}",
            negotiated.profile.profile_email
        ));
        console.print(&format!(
            "Your profile password is: {}",
            negotiated.profile.profile_secret
        ));
        console.print("Please write it down if you want to use your profile on other devices.");
    }

    Ok(negotiated)
}
