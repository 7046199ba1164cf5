//! Profile record
//!
//! The unit of identity for this device: a stable client id plus the
//! server-issued profile id and secret. Feature flags ride along but take
//! no part in negotiation.

use base64::{engine::general_purpose::URL_SAFE as BASE64_URL, Engine};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use uuid::Uuid;

/// Credential record persisted between runs
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub client_id: String,
    pub profile_id: String,
    pub profile_secret: String,
    pub profile_email: String,
    pub typing_on: bool,
    pub speaking_on: bool,
}

impl Profile {
    /// Fresh record for a new installation
    pub fn new() -> Self {
        Self {
            client_id: Uuid::new_v4().to_string(),
            ..Self::default()
        }
    }

    /// True when outbound requests carry a bearer token
    pub fn is_signable(&self) -> bool {
        !self.profile_id.is_empty() && !self.profile_secret.is_empty()
    }

    /// Hash of the email as sent to the negotiation endpoint
    pub fn email_hash(&self) -> String {
        hash_email(&self.profile_email)
    }

    /// Forget everything learned about the profile, keeping the client id
    pub fn clear_profile(&mut self) {
        self.profile_id.clear();
        self.profile_secret.clear();
        self.profile_email.clear();
    }
}

// Secret is redacted so records can go through `{:?}` safely
impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("client_id", &self.client_id)
            .field("profile_id", &self.profile_id)
            .field(
                "profile_secret",
                &if self.profile_secret.is_empty() { "" } else { "<redacted>" },
            )
            .field("profile_email", &self.profile_email)
            .field("typing_on", &self.typing_on)
            .field("speaking_on", &self.speaking_on)
            .finish()
    }
}

/// SHA-1 of the trimmed, lowercased email, base64 url-safe (padded)
pub fn hash_email(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Sha1::digest(normalized.as_bytes());
    BASE64_URL.encode(digest)
}
