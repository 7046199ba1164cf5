//! Credential Negotiator
//!
//! Drives the profile from whatever was cached locally to a state the server
//! has authorized, one POST per transition:
//!
//! ```text
//! NeedEmail ──email──▶ Posting ──204/200/201──▶ Authorized
//!     ▲                 │  ▲
//!     │             401 │  │ secret
//!     │             403 ▼  │
//!     └────change──── NeedPassword ◀──email (reset request)
//! ```
//!
//! The server is the only judge of secret correctness: every collected
//! password is POSTed, never checked locally.

use crate::collector::{collect_email, collect_password, PasswordEntry};
use crate::console::Console;
use crate::error::ProfileError;
use crate::profile::Profile;
use crate::signed_request::{SignedRequest, Verb};
use crate::transport::{HttpResponse, Transport};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const PREFERENCES_PATH: &str = "/preferences";
pub const REQUEST_EMAIL_PATH: &str = "/request-email";

// =============================================================================
// Types
// =============================================================================

/// Final result of a negotiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    pub profile: Profile,
    /// True when the server minted this profile during the negotiation
    pub created: bool,
}

/// Result of asking the server to mail the password
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Sent,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NeedEmail,
    Posting,
    NeedPassword { retry: bool },
    Authorized { created: bool },
}

/// How the server answered one negotiation POST
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostOutcome {
    Authorized { created: bool },
    NeedsSecret,
    WrongSecret,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NegotiationBody<'a> {
    client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_id: Option<&'a str>,
    email_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_secret: Option<&'a str>,
}

impl<'a> NegotiationBody<'a> {
    fn from_profile(profile: &'a Profile) -> Self {
        let non_empty = |s: &'a str| if s.is_empty() { None } else { Some(s) };
        Self {
            client_id: &profile.client_id,
            profile_id: non_empty(&profile.profile_id),
            email_hash: profile.email_hash(),
            profile_secret: non_empty(&profile.profile_secret),
        }
    }
}

/// 200/201 body: a profile with its secret
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuedProfile {
    profile_id: String,
    profile_secret: String,
}

/// 401 body: the profile that owns the email
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnownProfile {
    profile_id: String,
}

fn parse_body<D: DeserializeOwned>(response: &HttpResponse) -> Result<D, ProfileError> {
    serde_json::from_str(&response.body).map_err(|e| {
        ProfileError::Protocol(format!(
            "unexpected {} response body: {}",
            response.status, e
        ))
    })
}

// =============================================================================
// Negotiator
// =============================================================================

pub struct Negotiator<T, C> {
    transport: T,
    console: C,
}

impl<T: Transport, C: Console> Negotiator<T, C> {
    pub fn new(transport: T, console: C) -> Self {
        Self { transport, console }
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// Borrow the transport and the console together
    pub fn split(&mut self) -> (&T, &mut C) {
        (&self.transport, &mut self.console)
    }

    /// Run the negotiation loop until the server authorizes `profile`
    ///
    /// Fails with [`ProfileError::Aborted`] if the user quits.
    pub fn negotiate(&mut self, mut profile: Profile) -> Result<Negotiated, ProfileError> {
        if profile.client_id.is_empty() {
            return Err(ProfileError::Internal(
                "profile has no client id".to_string(),
            ));
        }

        let mut state = if profile.profile_email.is_empty() {
            State::NeedEmail
        } else {
            State::Posting
        };

        loop {
            tracing::debug!(op = "negotiator.state", state = ?state, "Negotiation step");

            state = match state {
                State::NeedEmail => {
                    profile.clear_profile();
                    profile.profile_email = collect_email(&mut self.console)?;
                    State::Posting
                }
                State::Posting => match self.post(&mut profile)? {
                    PostOutcome::Authorized { created } => State::Authorized { created },
                    PostOutcome::NeedsSecret => State::NeedPassword { retry: false },
                    PostOutcome::WrongSecret => State::NeedPassword { retry: true },
                },
                State::NeedPassword { retry } => {
                    match collect_password(&mut self.console, retry)? {
                        PasswordEntry::Secret(secret) => {
                            profile.profile_secret = secret;
                            State::Posting
                        }
                        PasswordEntry::ChangeEmail => State::NeedEmail,
                        PasswordEntry::RequestReset => {
                            match self.request_password_email(&profile)? {
                                ResetOutcome::Sent => self.console.print(&format!(
                                    "An email with your password has been sent to {}.",
                                    profile.profile_email
                                )),
                                ResetOutcome::NotFound => self.console.print(&format!(
                                    "Sorry, there is no profile for {}.",
                                    profile.profile_email
                                )),
                            }
                            State::NeedPassword { retry: false }
                        }
                    }
                }
                State::Authorized { created } => {
                    tracing::info!(
                        op = "negotiator.authorized",
                        profile_id = %profile.profile_id,
                        created = created,
                        "Profile authorized"
                    );
                    return Ok(Negotiated { profile, created });
                }
            };
        }
    }

    /// POST the profile to the negotiation endpoint and fold the answer in
    ///
    /// On failure the profile is left as it was, except that a rejected
    /// secret is cleared.
    fn post(&self, profile: &mut Profile) -> Result<PostOutcome, ProfileError> {
        let body = NegotiationBody::from_profile(profile);
        let submitted_secret = profile.profile_secret.clone();

        let request =
            SignedRequest::anonymous(&profile.client_id, Verb::Post, PREFERENCES_PATH, Some(&body))?;
        let response = self.transport.send(&request)?;

        tracing::info!(
            op = "negotiator.post",
            client_id = %profile.client_id,
            with_secret = !submitted_secret.is_empty(),
            status = response.status,
            "Negotiation response"
        );

        match response.status {
            204 => {
                if submitted_secret.is_empty() {
                    return Err(ProfileError::Protocol(
                        "server authorized a profile without a secret".to_string(),
                    ));
                }
                Ok(PostOutcome::Authorized { created: false })
            }
            200 | 201 => {
                let issued: IssuedProfile = parse_body(&response)?;
                if issued.profile_id.is_empty() || issued.profile_secret.is_empty() {
                    return Err(ProfileError::Protocol(
                        "server response is missing profileId or profileSecret".to_string(),
                    ));
                }
                let created = response.status == 201 || issued.profile_secret != submitted_secret;
                profile.profile_id = issued.profile_id;
                profile.profile_secret = issued.profile_secret;
                Ok(PostOutcome::Authorized { created })
            }
            401 => {
                let known: KnownProfile = parse_body(&response)?;
                if known.profile_id.is_empty() {
                    return Err(ProfileError::Protocol(
                        "server response is missing profileId".to_string(),
                    ));
                }
                profile.profile_id = known.profile_id;
                profile.profile_secret.clear();
                Ok(PostOutcome::NeedsSecret)
            }
            403 => {
                profile.profile_secret.clear();
                Ok(PostOutcome::WrongSecret)
            }
            status => Err(ProfileError::Server {
                status,
                body: response.body,
            }),
        }
    }

    /// Ask the server to mail the profile password to the plaintext email
    pub fn request_password_email(&self, profile: &Profile) -> Result<ResetOutcome, ProfileError> {
        let request = SignedRequest::anonymous(
            &profile.client_id,
            Verb::Post,
            REQUEST_EMAIL_PATH,
            Some(profile.profile_email.as_str()),
        )?;
        let response = self.transport.send(&request)?;

        tracing::info!(
            op = "negotiator.request_email",
            status = response.status,
            "Password email requested"
        );

        match response.status {
            404 => Ok(ResetOutcome::NotFound),
            _ if response.is_success() => Ok(ResetOutcome::Sent),
            status => Err(ProfileError::Server {
                status,
                body: response.body,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ScriptedConsole;
    use crate::profile::hash_email;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    const S0: &str = "00000000-0000-4000-8000-000000000000";
    const S1: &str = "550e8400-e29b-41d4-a716-446655440000";

    /// Replays canned responses and records every request
    #[derive(Default)]
    struct FakeTransport {
        responses: RefCell<VecDeque<Result<HttpResponse, ProfileError>>>,
        sent: RefCell<Vec<SignedRequest>>,
    }

    impl FakeTransport {
        fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: RefCell::new(responses.into_iter().map(Ok).collect()),
                sent: RefCell::new(Vec::new()),
            }
        }

        fn failing(err: ProfileError) -> Self {
            Self {
                responses: RefCell::new(VecDeque::from(vec![Err(err)])),
                sent: RefCell::new(Vec::new()),
            }
        }

        fn count(&self, path: &str) -> usize {
            self.sent.borrow().iter().filter(|r| r.path == path).count()
        }

        fn body(&self, index: usize) -> Value {
            serde_json::from_slice(self.sent.borrow()[index].body.as_ref().unwrap()).unwrap()
        }
    }

    impl Transport for FakeTransport {
        fn send(&self, request: &SignedRequest) -> Result<HttpResponse, ProfileError> {
            self.sent.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .expect("unexpected request")
        }
    }

    fn profile_with_email() -> Profile {
        Profile {
            profile_email: "a@b.com".to_string(),
            ..Profile::new()
        }
    }

    fn issued(id: &str, secret: &str) -> String {
        json!({ "profileId": id, "profileSecret": secret }).to_string()
    }

    #[test]
    fn test_creates_profile_from_empty_record() {
        let transport = FakeTransport::new(vec![HttpResponse::new(201, issued("P1", S1))]);
        let mut console = ScriptedConsole::new(["a@b.com"]);
        let mut negotiator = Negotiator::new(&transport, &mut console);

        let result = negotiator.negotiate(Profile::new()).unwrap();

        assert!(result.created);
        assert_eq!(result.profile.profile_id, "P1");
        assert_eq!(result.profile.profile_secret, S1);
        assert_eq!(result.profile.profile_email, "a@b.com");
        assert_eq!(transport.count(PREFERENCES_PATH), 1);
    }

    #[test]
    fn test_post_body_hashes_email() {
        let transport = FakeTransport::new(vec![HttpResponse::new(201, issued("P1", S1))]);
        let mut negotiator = Negotiator::new(&transport, ScriptedConsole::default());
        let profile = profile_with_email();
        let client_id = profile.client_id.clone();

        negotiator.negotiate(profile).unwrap();

        let body = transport.body(0);
        assert_eq!(body["clientId"], client_id.as_str());
        assert_eq!(body["emailHash"], hash_email("a@b.com").as_str());
        assert!(body.get("profileSecret").is_none());
        assert!(body.get("profileId").is_none());
        assert!(!body.to_string().contains("a@b.com"));

        let sent = transport.sent.borrow();
        assert_eq!(sent[0].header("X-Client-Id"), Some(client_id.as_str()));
        assert!(sent[0].header("Authorization").is_none());
    }

    #[test]
    fn test_known_email_then_password() {
        let transport = FakeTransport::new(vec![
            HttpResponse::new(401, json!({ "profileId": "P1" }).to_string()),
            HttpResponse::new(204, ""),
        ]);
        let mut console = ScriptedConsole::new([S1]);
        let mut negotiator = Negotiator::new(&transport, &mut console);

        let result = negotiator.negotiate(profile_with_email()).unwrap();

        assert!(!result.created);
        assert_eq!(result.profile.profile_id, "P1");
        assert_eq!(result.profile.profile_secret, S1);
        assert_eq!(transport.count(PREFERENCES_PATH), 2);

        let second = transport.body(1);
        assert_eq!(second["profileId"], "P1");
        assert_eq!(second["profileSecret"], S1);
        assert!(!console.output().contains("wrong password"));
    }

    #[test]
    fn test_wrong_secret_then_quit() {
        let transport = FakeTransport::new(vec![HttpResponse::new(403, "")]);
        let mut console = ScriptedConsole::new(["quit"]);
        let mut profile = profile_with_email();
        profile.profile_id = "P1".to_string();
        profile.profile_secret = S0.to_string();

        let err = Negotiator::new(&transport, &mut console)
            .negotiate(profile)
            .unwrap_err();

        assert!(err.is_aborted());
        assert_eq!(transport.count(PREFERENCES_PATH), 1);
        assert!(console.output().contains("wrong password"));
    }

    #[test]
    fn test_wrong_secret_then_correct() {
        let transport = FakeTransport::new(vec![
            HttpResponse::new(403, ""),
            HttpResponse::new(204, ""),
        ]);
        let mut console = ScriptedConsole::new(["not-a-uuid", S1]);
        let mut profile = profile_with_email();
        profile.profile_id = "P1".to_string();
        profile.profile_secret = S0.to_string();

        let result = Negotiator::new(&transport, &mut console)
            .negotiate(profile)
            .unwrap();

        assert!(!result.created);
        assert_eq!(result.profile.profile_id, "P1");
        assert_eq!(result.profile.profile_secret, S1);
        // The malformed entry never reached the server
        assert_eq!(transport.count(PREFERENCES_PATH), 2);
    }

    #[test]
    fn test_learned_profile_id_survives_wrong_password() {
        let transport = FakeTransport::new(vec![
            HttpResponse::new(401, json!({ "profileId": "P1" }).to_string()),
            HttpResponse::new(403, ""),
            HttpResponse::new(204, ""),
        ]);
        let mut console = ScriptedConsole::new([S0, S1]);

        let result = Negotiator::new(&transport, &mut console)
            .negotiate(profile_with_email())
            .unwrap();

        assert!(!result.created);
        assert_eq!(result.profile.profile_id, "P1");
        assert_eq!(result.profile.profile_secret, S1);
        assert_eq!(transport.count(PREFERENCES_PATH), 3);

        let wrong = transport.body(1);
        assert_eq!(wrong["profileId"], "P1");
        assert_eq!(wrong["profileSecret"], S0);

        let third = transport.body(2);
        assert_eq!(third["profileId"], "P1");
        assert_eq!(third["profileSecret"], S1);
        assert_eq!(third["emailHash"], hash_email("a@b.com").as_str());
        assert!(console.output().contains("wrong password"));
    }

    #[test]
    fn test_server_error_skips_collector() {
        let transport = FakeTransport::new(vec![HttpResponse::new(500, "boom")]);
        let mut console = ScriptedConsole::default();

        let err = Negotiator::new(&transport, &mut console)
            .negotiate(profile_with_email())
            .unwrap_err();

        assert_eq!(
            err,
            ProfileError::Server {
                status: 500,
                body: "boom".to_string()
            }
        );
        assert!(console.transcript.is_empty());
    }

    #[test]
    fn test_network_error_propagates() {
        let transport = FakeTransport::failing(ProfileError::Network("refused".to_string()));
        let err = Negotiator::new(&transport, ScriptedConsole::default())
            .negotiate(profile_with_email())
            .unwrap_err();
        assert!(matches!(err, ProfileError::Network(_)));
    }

    #[test]
    fn test_authorized_record_is_idempotent() {
        let transport = FakeTransport::new(vec![
            HttpResponse::new(204, ""),
            HttpResponse::new(204, ""),
        ]);
        let mut profile = profile_with_email();
        profile.profile_id = "P1".to_string();
        profile.profile_secret = S1.to_string();

        let mut negotiator = Negotiator::new(&transport, ScriptedConsole::default());
        let first = negotiator.negotiate(profile.clone()).unwrap();
        assert_eq!(transport.count(PREFERENCES_PATH), 1);
        let second = negotiator.negotiate(first.profile.clone()).unwrap();
        assert_eq!(transport.count(PREFERENCES_PATH), 2);

        assert_eq!(first, second);
        assert_eq!(first.profile, profile);
        assert!(!first.created);
    }

    #[test]
    fn test_ok_with_body_compares_secrets() {
        let mut profile = profile_with_email();
        profile.profile_id = "P1".to_string();
        profile.profile_secret = S1.to_string();

        let transport = FakeTransport::new(vec![HttpResponse::new(200, issued("P1", S1))]);
        let result = Negotiator::new(&transport, ScriptedConsole::default())
            .negotiate(profile.clone())
            .unwrap();
        assert!(!result.created);

        let transport = FakeTransport::new(vec![HttpResponse::new(200, issued("P2", S0))]);
        let result = Negotiator::new(&transport, ScriptedConsole::default())
            .negotiate(profile)
            .unwrap();
        assert!(result.created);
        assert_eq!(result.profile.profile_id, "P2");
        assert_eq!(result.profile.profile_secret, S0);
    }

    #[test]
    fn test_no_content_without_secret_is_protocol_error() {
        let transport = FakeTransport::new(vec![HttpResponse::new(204, "")]);
        let err = Negotiator::new(&transport, ScriptedConsole::default())
            .negotiate(profile_with_email())
            .unwrap_err();
        assert!(matches!(err, ProfileError::Protocol(_)));
    }

    #[test]
    fn test_malformed_body_is_protocol_error() {
        for response in [
            HttpResponse::new(201, "not json"),
            HttpResponse::new(201, json!({ "profileId": "P1" }).to_string()),
            HttpResponse::new(401, "{}"),
        ] {
            let transport = FakeTransport::new(vec![response]);
            let err = Negotiator::new(&transport, ScriptedConsole::default())
                .negotiate(profile_with_email())
                .unwrap_err();
            assert!(matches!(err, ProfileError::Protocol(_)), "got {:?}", err);
        }
    }

    #[test]
    fn test_change_email_restarts() {
        let transport = FakeTransport::new(vec![
            HttpResponse::new(401, json!({ "profileId": "P1" }).to_string()),
            HttpResponse::new(201, issued("P9", S1)),
        ]);
        let mut console = ScriptedConsole::new(["change", "c@d.org"]);

        let result = Negotiator::new(&transport, &mut console)
            .negotiate(profile_with_email())
            .unwrap();

        assert!(result.created);
        assert_eq!(result.profile.profile_email, "c@d.org");
        assert_eq!(result.profile.profile_id, "P9");

        let second = transport.body(1);
        assert_eq!(second["emailHash"], hash_email("c@d.org").as_str());
        assert!(second.get("profileId").is_none());
    }

    #[test]
    fn test_reset_request_sends_plain_email_only() {
        let transport = FakeTransport::new(vec![
            HttpResponse::new(403, ""),
            HttpResponse::new(202, ""),
            HttpResponse::new(204, ""),
        ]);
        let mut console = ScriptedConsole::new(["email", S1]);
        let mut profile = profile_with_email();
        profile.profile_id = "P1".to_string();
        profile.profile_secret = S0.to_string();

        let result = Negotiator::new(&transport, &mut console)
            .negotiate(profile)
            .unwrap();
        assert_eq!(result.profile.profile_secret, S1);

        assert_eq!(transport.count(REQUEST_EMAIL_PATH), 1);
        let reset = transport.body(1);
        assert_eq!(reset, json!("a@b.com"));
        assert!(!reset.to_string().contains(S0));
        assert!(console.output().contains("has been sent to a@b.com"));
    }

    #[test]
    fn test_reset_request_not_found_reprompts() {
        let transport = FakeTransport::new(vec![
            HttpResponse::new(401, json!({ "profileId": "P1" }).to_string()),
            HttpResponse::new(404, ""),
        ]);
        let mut console = ScriptedConsole::new(["email", "quit"]);

        let err = Negotiator::new(&transport, &mut console)
            .negotiate(profile_with_email())
            .unwrap_err();

        assert!(err.is_aborted());
        assert!(console.output().contains("no profile for a@b.com"));
        assert_eq!(transport.count(PREFERENCES_PATH), 1);
    }

    #[test]
    fn test_reset_request_server_error_is_fatal() {
        let transport = FakeTransport::new(vec![
            HttpResponse::new(401, json!({ "profileId": "P1" }).to_string()),
            HttpResponse::new(500, "down"),
        ]);
        let mut console = ScriptedConsole::new(["email"]);

        let err = Negotiator::new(&transport, &mut console)
            .negotiate(profile_with_email())
            .unwrap_err();
        assert!(matches!(err, ProfileError::Server { status: 500, .. }));
    }

    #[test]
    fn test_missing_client_id_is_internal_error() {
        let transport = FakeTransport::new(vec![]);
        let err = Negotiator::new(&transport, ScriptedConsole::default())
            .negotiate(Profile::default())
            .unwrap_err();
        assert!(matches!(err, ProfileError::Internal(_)));
    }
}
