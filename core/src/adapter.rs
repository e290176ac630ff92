//! Authenticated request execution.
//!
//! # Design
//! `ApiAdapter` sits between the stateless `DirectoryClient` and a
//! `Transport`. On the way out it attaches the stored bearer token; on the
//! way back it watches for 401. A 401 on any path other than login or
//! registration means the session is gone: both credential slots are
//! emptied and the `Navigator` is sent to the login entry point. A 401 from
//! the auth endpoints passes through untouched so the login form can show
//! it. Nothing is retried.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::DirectoryClient;
use crate::credentials::Credentials;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::navigation::Navigator;
use crate::transport::Transport;

pub struct ApiAdapter {
    client: DirectoryClient,
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    navigator: Arc<dyn Navigator>,
}

impl ApiAdapter {
    pub fn new(
        client: DirectoryClient,
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            client,
            transport,
            credentials,
            navigator,
        }
    }

    pub fn client(&self) -> &DirectoryClient {
        &self.client
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Execute a prepared request. Failure statuses come back as
    /// `Ok(response)` unless they trigger a forced sign-out, in which case
    /// the 401 is returned as `ApiError::Http`.
    pub async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        if let Some(token) = self.credentials.token() {
            request
                .headers
                .push(("authorization".to_string(), format!("Bearer {token}")));
        }

        let method = request.method;
        let path = request.path.clone();
        let auth_request = request.is_auth_request();

        let response = self.transport.execute(request).await.map_err(|e| {
            warn!(method = method.as_str(), %path, error = %e, "request failed");
            e
        })?;
        debug!(method = method.as_str(), %path, status = response.status, "response");

        if response.status == 401 && !auth_request {
            self.sign_out(&path);
            return Err(crate::client::status_error(&response));
        }
        Ok(response)
    }

    /// `send(method, path, body?) -> JSON`: a relative path, an optional JSON
    /// body, and a decoded JSON reply (`null` for an empty body).
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        let request = self.client.build(method, path, body)?;
        let response = self.execute(request).await?;
        self.client.parse_json(response)
    }

    fn sign_out(&self, path: &str) {
        warn!(%path, "unauthorized response, clearing stored credentials");
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "failed to clear credentials");
        }
        self.navigator.redirect_to_login();
    }
}

impl std::fmt::Debug for ApiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiAdapter")
            .field("client", &self.client)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
