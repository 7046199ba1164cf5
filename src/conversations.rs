//! Whisper conversation calls
//!
//! Plain CRUD against `/profiles/<id>/whisper-conversations`, every call
//! signed with the negotiated profile.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use whisper_profile_core::signed_request::NO_BODY;
use whisper_profile_core::{build_signed_request, HttpResponse, Profile, ProfileError, Transport};

pub struct ConversationClient<'a, T> {
    transport: &'a T,
    profile: &'a Profile,
}

fn parse_body<D: DeserializeOwned>(response: &HttpResponse) -> Result<D, ProfileError> {
    serde_json::from_str(&response.body).map_err(ProfileError::from)
}

fn server_error(response: HttpResponse) -> ProfileError {
    ProfileError::Server {
        status: response.status,
        body: response.body,
    }
}

impl<'a, T: Transport> ConversationClient<'a, T> {
    pub fn new(transport: &'a T, profile: &'a Profile) -> Self {
        Self { transport, profile }
    }

    fn collection_path(&self) -> String {
        format!("/profiles/{}/whisper-conversations", self.profile.profile_id)
    }

    /// All conversations, name -> id
    pub fn list(&self) -> Result<BTreeMap<String, String>, ProfileError> {
        let request = build_signed_request(self.profile, &self.collection_path(), "GET", NO_BODY)?;
        let response = self.transport.send(&request)?;
        if response.status != 200 {
            return Err(server_error(response));
        }
        parse_body(&response)
    }

    /// Create a conversation, returning its id
    pub fn create(&self, name: &str) -> Result<String, ProfileError> {
        let request = build_signed_request(self.profile, &self.collection_path(), "POST", Some(name))?;
        let response = self.transport.send(&request)?;
        if response.status != 201 {
            return Err(server_error(response));
        }
        let id: String = parse_body(&response)?;

        tracing::info!(op = "conversations.create", conversation_id = %id, "Conversation created");
        Ok(id)
    }

    /// Id of the conversation called `name`, if any
    pub fn find_id(&self, name: &str) -> Result<Option<String>, ProfileError> {
        Ok(self.list()?.remove(name))
    }

    /// Delete the conversation called `name`
    ///
    /// Returns the deleted id, or None if no conversation has that name.
    pub fn delete(&self, name: &str) -> Result<Option<String>, ProfileError> {
        let Some(id) = self.find_id(name)? else {
            return Ok(None);
        };

        let path = format!("{}/{}", self.collection_path(), id);
        let request = build_signed_request(self.profile, &path, "DELETE", NO_BODY)?;
        let response = self.transport.send(&request)?;
        if !response.is_success() {
            return Err(server_error(response));
        }

        tracing::info!(op = "conversations.delete", conversation_id = %id, "Conversation deleted");
        Ok(Some(id))
    }
}
