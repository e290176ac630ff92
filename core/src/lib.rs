//! Authenticated client core for a remote user-directory API.
//!
//! # Overview
//! A session manager and a collection synchronizer share one `ApiAdapter`.
//! The adapter attaches the stored bearer token to every request and signs
//! the user out when a non-auth endpoint answers 401. Managers keep their
//! state in `watch` channels; the view layer renders snapshots and calls
//! operations, which never return errors past the state they write.
//!
//! # Design
//! - `DirectoryClient` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`.
//! - `Transport` is the only I/O seam; `ReqwestTransport` is the real one.
//! - Credentials are an injected `CredentialStore` pair, not globals.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod adapter;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod navigation;
pub mod outcome;
pub mod session;
pub mod transport;
pub mod types;
pub mod users;
pub mod validation;

#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use adapter::ApiAdapter;
pub use client::DirectoryClient;
pub use config::ClientConfig;
pub use credentials::{CredentialStore, Credentials, FileStore, MemoryStore};
pub use error::{ApiError, ConfigError, StoreError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use navigation::{Navigator, Route, RouteWatch};
pub use outcome::{FetchOrdering, Outcome};
pub use session::{Session, SessionManager, SessionPhase};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    CreatedUser, LoginRequest, LoginResponse, NewUser, UpdatedUser, UserPage, UserPatch, UserRecord,
};
pub use users::{CollectionView, Pagination, UserCollection, ViewMode};
pub use validation::{LoginForm, UserForm, ValidationError, ValidationErrors};

/// Both managers wired to one adapter.
#[derive(Debug)]
pub struct UserDirectory {
    adapter: Arc<ApiAdapter>,
    session: SessionManager,
    users: UserCollection,
}

impl UserDirectory {
    /// Build a directory that talks HTTP through `reqwest`.
    pub fn connect(
        config: &ClientConfig,
        credentials: Credentials,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout())?);
        Ok(Self::with_transport(config, transport, credentials, navigator))
    }

    pub fn with_transport(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let mut client = DirectoryClient::new(&config.base_url);
        if let Some(key) = &config.api_key {
            client = client.with_api_key(key.clone());
        }
        let adapter = Arc::new(ApiAdapter::new(client, transport, credentials, navigator));
        Self {
            session: SessionManager::new(adapter.clone()),
            users: UserCollection::new(adapter.clone(), config.ordering),
            adapter,
        }
    }

    pub fn adapter(&self) -> &ApiAdapter {
        &self.adapter
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn users(&self) -> &UserCollection {
        &self.users
    }
}
