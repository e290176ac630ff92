//! Stateless HTTP request builder and response parser for the directory API.
//!
//! # Design
//! `DirectoryClient` holds only the base URL and the static API key. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`. Credentials and
//! the actual round-trip are the adapter's job, so everything here stays
//! deterministic.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    CreatedUser, ErrorBody, LoginRequest, LoginResponse, NewUser, UpdatedUser, UserEnvelope,
    UserPage, UserPatch, UserRecord,
};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Synchronous, stateless client for the directory API.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    base_url: String,
    api_key: Option<String>,
}

impl DirectoryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request for an arbitrary path relative to the base URL.
    /// A `Some` body is sent as JSON.
    pub fn build(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<HttpRequest, ApiError> {
        let body = body
            .map(|value| serde_json::to_string(value))
            .transpose()
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.request(method, path, body))
    }

    pub fn build_login(&self, credentials: &LoginRequest) -> Result<HttpRequest, ApiError> {
        let body = to_json(credentials)?;
        Ok(self.request(HttpMethod::Post, "/register", Some(body)))
    }

    pub fn build_list_users(&self, page: u32, per_page: u32) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/users?page={page}&per_page={per_page}"),
            None,
        )
    }

    pub fn build_get_user(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/users/{id}"), None)
    }

    pub fn build_create_user(&self, input: &NewUser) -> Result<HttpRequest, ApiError> {
        let body = to_json(input)?;
        Ok(self.request(HttpMethod::Post, "/users", Some(body)))
    }

    pub fn build_update_user(&self, id: u64, input: &UserPatch) -> Result<HttpRequest, ApiError> {
        let body = to_json(input)?;
        Ok(self.request(HttpMethod::Put, &format!("/users/{id}"), Some(body)))
    }

    pub fn build_delete_user(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/users/{id}"), None)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResponse, ApiError> {
        check_success(&response)?;
        from_json(&response.body)
    }

    pub fn parse_list_users(&self, response: HttpResponse) -> Result<UserPage, ApiError> {
        check_success(&response)?;
        from_json(&response.body)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<UserRecord, ApiError> {
        check_success(&response)?;
        from_json::<UserEnvelope>(&response.body).map(|envelope| envelope.data)
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<CreatedUser, ApiError> {
        check_success(&response)?;
        from_json(&response.body)
    }

    pub fn parse_update_user(&self, response: HttpResponse) -> Result<UpdatedUser, ApiError> {
        check_success(&response)?;
        from_json(&response.body)
    }

    pub fn parse_delete_user(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_success(&response)?;
        Ok(())
    }

    /// Decode any successful response as JSON; an empty body decodes as `null`.
    pub fn parse_json(&self, response: HttpResponse) -> Result<serde_json::Value, ApiError> {
        if !response.is_success() {
            return Err(status_error(&response));
        }
        if response.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        from_json(&response.body)
    }

    fn request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        if let Some(key) = &self.api_key {
            headers.push((API_KEY_HEADER.to_string(), key.clone()));
        }
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            endpoint: path.to_string(),
            headers,
            body,
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Any 2xx is success; everything else becomes `ApiError::Http`.
fn check_success(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(status_error(response))
}

/// Pull the server's `error` message out of a failure body, if any.
pub(crate) fn status_error(response: &HttpResponse) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.error);
    ApiError::Http {
        status: response.status,
        message,
    }
}
