//! Whisper Profile Core
//!
//! Reconciles the locally cached profile with the Whisper server before any
//! authenticated API call is made.
//!
//! ## Components
//!
//! - [`profile`]: the credential record and its invariants
//! - [`profile_store`]: on-disk persistence (atomic, owner-only)
//! - [`signed_request`]: request envelopes with client id and bearer token
//! - [`collector`]: interactive email/password collection
//! - [`negotiator`]: the negotiation state machine
//! - [`transport`]: blocking HTTP transport for request envelopes
//! - [`startup`]: load, negotiate, persist
//!
//! ## Security Invariants
//!
//! - The profile secret is NEVER logged
//! - The profile secret is displayed only when a profile is created
//! - The negotiation endpoint only ever sees a hash of the email
//! - The stored profile is always the last authorized one

pub mod collector;
pub mod console;
pub mod error;
pub mod negotiator;
pub mod profile;
pub mod profile_store;
pub mod signed_request;
pub mod startup;
pub mod transport;

pub use console::{Console, InputClosed, ScriptedConsole};
pub use error::ProfileError;
pub use negotiator::{Negotiated, Negotiator};
pub use profile::Profile;
pub use profile_store::ProfileStore;
pub use signed_request::{build_signed_request, SignedRequest, Verb};
pub use transport::{HttpResponse, HttpTransport, Transport};
