//! Blocking HTTP transport for [`SignedRequest`] envelopes

use crate::error::ProfileError;
use crate::signed_request::{SignedRequest, Verb};
use std::time::Duration;

/// Status and raw body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and waits for its response
///
/// Implementations report connection-level failures as
/// [`ProfileError::Network`]; any HTTP status is a successful exchange.
pub trait Transport {
    fn send(&self, request: &SignedRequest) -> Result<HttpResponse, ProfileError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &SignedRequest) -> Result<HttpResponse, ProfileError> {
        (**self).send(request)
    }
}

/// reqwest-backed transport rooted at the API base address
pub struct HttpTransport {
    api_root: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(api_root: &str, timeout: Duration) -> Result<Self, ProfileError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProfileError::Internal(format!("Client build error: {}", e)))?;

        Ok(Self {
            api_root: api_root.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn method(verb: Verb) -> reqwest::Method {
        match verb {
            Verb::Get => reqwest::Method::GET,
            Verb::Head => reqwest::Method::HEAD,
            Verb::Delete => reqwest::Method::DELETE,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Patch => reqwest::Method::PATCH,
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &SignedRequest) -> Result<HttpResponse, ProfileError> {
        let url = format!("{}{}", self.api_root, request.path);

        let mut builder = self.client.request(Self::method(request.verb), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|e| {
            tracing::warn!(
                op = "transport.send.failed",
                verb = %request.verb,
                path = %request.path,
                error = %e,
                "Request failed"
            );
            ProfileError::Network(format!("Request failed: {}", e))
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| ProfileError::Network(format!("Failed to read response: {}", e)))?;

        tracing::debug!(
            op = "transport.send",
            verb = %request.verb,
            path = %request.path,
            status = status,
            "Response received"
        );

        Ok(HttpResponse { status, body })
    }
}
