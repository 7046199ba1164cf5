//! Signed Request Builder
//!
//! Turns a profile and a request intent into a [`SignedRequest`] envelope.
//! No network I/O happens here; the envelope is handed to a
//! [`Transport`](crate::transport::Transport).
//!
//! ## Token format
//!
//! HS256 JWT with claims `{iss: client_id, sub: profile_id, iat}`. The HMAC
//! key is the 16 raw bytes of the profile secret parsed as a UUID. The server
//! derives the same key, so this derivation must not change.

use crate::error::ProfileError;
use crate::profile::Profile;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use uuid::Uuid;
use zeroize::Zeroizing;

pub const HEADER_CLIENT_ID: &str = "X-Client-Id";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

/// Convenience for body-less calls to [`build_signed_request`]
pub const NO_BODY: Option<&()> = None;

// =============================================================================
// Types
// =============================================================================

/// HTTP verbs the builder knows how to envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Head,
    Delete,
    Post,
    Put,
    Patch,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Delete => "DELETE",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
        }
    }

    /// POST, PUT and PATCH carry a JSON body; the rest carry none
    pub fn has_body(&self) -> bool {
        matches!(self, Verb::Post | Verb::Put | Verb::Patch)
    }
}

impl std::str::FromStr for Verb {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Verb::Get),
            "HEAD" => Ok(Verb::Head),
            "DELETE" => Ok(Verb::Delete),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            other => Err(ProfileError::Internal(format!("unknown HTTP verb: {}", other))),
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound request envelope, relative to the API root
#[derive(Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub verb: Verb,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl SignedRequest {
    /// Request with a client id header and no bearer token
    pub fn anonymous<B: Serialize + ?Sized>(
        client_id: &str,
        verb: Verb,
        path: &str,
        body: Option<&B>,
    ) -> Result<Self, ProfileError> {
        if client_id.is_empty() {
            return Err(ProfileError::Internal(
                "client id must be set before building a request".to_string(),
            ));
        }

        let mut headers = vec![(HEADER_CLIENT_ID.to_string(), client_id.to_string())];

        let body = if verb.has_body() {
            let payload = serde_json::to_vec(&body)
                .map_err(|e| ProfileError::Internal(format!("body serialization failed: {}", e)))?;
            headers.push((HEADER_CONTENT_TYPE.to_string(), "application/json".to_string()));
            Some(payload)
        } else {
            None
        };

        Ok(Self {
            verb,
            path: path.to_string(),
            headers,
            body,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// Authorization carries a bearer token; keep it out of debug output
impl std::fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(key, value)| {
                if key == HEADER_AUTHORIZATION {
                    (key.as_str(), "Bearer <redacted>")
                } else {
                    (key.as_str(), value.as_str())
                }
            })
            .collect();
        f.debug_struct("SignedRequest")
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("headers", &headers)
            .field("body_len", &self.body.as_ref().map(|b| b.len()))
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    sub: &'a str,
    iat: i64,
}

// =============================================================================
// Builder
// =============================================================================

/// Build a request envelope for an API call made on behalf of `profile`
///
/// Signs it whenever the profile has both an id and a secret.
pub fn build_signed_request<B: Serialize + ?Sized>(
    profile: &Profile,
    path: &str,
    verb: &str,
    body: Option<&B>,
) -> Result<SignedRequest, ProfileError> {
    let verb: Verb = verb.parse()?;
    let mut request = SignedRequest::anonymous(&profile.client_id, verb, path, body)?;

    if profile.is_signable() {
        let token = make_jwt(profile, Utc::now().timestamp())?;
        request
            .headers
            .push((HEADER_AUTHORIZATION.to_string(), format!("Bearer {}", token)));
    }

    tracing::debug!(
        op = "signed_request.build",
        verb = %verb,
        path = %path,
        signed = profile.is_signable(),
        "Request built"
    );

    Ok(request)
}

/// Derive the HMAC key from the profile secret (raw UUID bytes)
fn signing_key(profile_secret: &str) -> Result<Zeroizing<[u8; 16]>, ProfileError> {
    let uuid = Uuid::parse_str(profile_secret)
        .map_err(|e| ProfileError::Internal(format!("profile secret is not a UUID: {}", e)))?;
    Ok(Zeroizing::new(*uuid.as_bytes()))
}

/// Produce the HS256 bearer token for `profile`, issued at `issued_at`
pub fn make_jwt(profile: &Profile, issued_at: i64) -> Result<String, ProfileError> {
    let key = signing_key(&profile.profile_secret)?;

    let claims = Claims {
        iss: &profile.client_id,
        sub: &profile.profile_id,
        iat: issued_at,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(key.as_slice()),
    )
    .map_err(|e| ProfileError::Internal(format!("failed to sign token: {}", e)))
}
