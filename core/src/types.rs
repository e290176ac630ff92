//! Domain DTOs for the user directory API.
//!
//! # Design
//! These types mirror the remote API's JSON schema but are defined
//! independently from the mock-server crate. Integration tests catch any
//! schema drift between the two.

use serde::{Deserialize, Serialize};

/// A single user record as owned by the remote collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
}

impl UserRecord {
    /// Case-insensitive substring match on first name, last name and email.
    /// `needle` must already be lowercase.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.first_name.to_lowercase().contains(needle)
            || self.last_name.to_lowercase().contains(needle)
            || self.email.to_lowercase().contains(needle)
    }
}

/// One page of the user collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPage {
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
    pub total_pages: u32,
    pub data: Vec<UserRecord>,
}

/// Envelope around a single record returned by `GET /users/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub data: UserRecord,
}

/// Credentials posted to the session endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session endpoint reply. Extra fields (such as `id`) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Request payload for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub job: String,
}

/// Request payload for updating a user. Only the fields present in the JSON
/// are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
}

impl From<NewUser> for UserPatch {
    fn from(user: NewUser) -> Self {
        Self {
            name: Some(user.name),
            job: Some(user.job),
        }
    }
}

/// Server acknowledgement of a create. The id is a string on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedUser {
    pub id: String,
    pub name: String,
    pub job: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Server acknowledgement of an update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdatedUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// Failure body: `{"error": "..."}`. Some failures send `{}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
