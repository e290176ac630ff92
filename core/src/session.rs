//! Session manager: authentication state and the login/logout lifecycle.
//!
//! # Design
//! The `Session` value lives in a `watch` channel; every transition is one
//! `send_modify` running the pure `reduce` function, so subscribers see the
//! state before or after a call, never in between. The token is written to
//! the credential store only after the login call succeeded.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::ApiAdapter;
use crate::credentials::Credentials;
use crate::outcome::Outcome;
use crate::validation::{LoginForm, ValidationErrors};

pub const LOGIN_FAILED: &str = "Login failed";

/// Authentication state. `is_authenticated` is true iff `token` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub is_authenticated: bool,
    pub token: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Session {
    /// Session as restored from stored credentials.
    pub fn restore(token: Option<String>) -> Self {
        Self {
            is_authenticated: token.is_some(),
            token,
            loading: false,
            error: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Authenticating
        } else if self.error.is_some() {
            SessionPhase::Error
        } else if self.is_authenticated {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticating,
    Authenticated,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    Login(Outcome<String>),
    Logout,
    ClearError,
    Restore(Option<String>),
}

pub fn reduce(state: &mut Session, action: SessionAction) {
    match action {
        SessionAction::Login(Outcome::Pending) => {
            state.loading = true;
            state.error = None;
        }
        SessionAction::Login(Outcome::Ok(token)) => {
            state.loading = false;
            state.is_authenticated = true;
            state.token = Some(token);
            state.error = None;
        }
        SessionAction::Login(Outcome::Err(message)) => {
            state.loading = false;
            state.error = Some(message);
        }
        SessionAction::Logout => {
            state.is_authenticated = false;
            state.token = None;
            state.error = None;
        }
        SessionAction::ClearError => state.error = None,
        SessionAction::Restore(token) => {
            state.is_authenticated = token.is_some();
            state.token = token;
        }
    }
}

pub struct SessionManager {
    adapter: Arc<ApiAdapter>,
    state: watch::Sender<Session>,
}

impl SessionManager {
    /// Start from whatever token the credential store already holds.
    pub fn new(adapter: Arc<ApiAdapter>) -> Self {
        let (state, _) = watch::channel(Session::restore(adapter.credentials().token()));
        Self { adapter, state }
    }

    fn credentials(&self) -> &Credentials {
        self.adapter.credentials()
    }

    fn dispatch(&self, action: SessionAction) {
        self.state.send_modify(|state| reduce(state, action));
    }

    pub fn state(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Whether the last login asked to be remembered.
    pub fn remembered(&self) -> bool {
        self.credentials().remembered()
    }

    /// Authenticate and store the token in the slot picked by `remember`.
    /// Failures end up in `Session::error`; the returned outcome mirrors
    /// what was reduced.
    pub async fn login(&self, email: &str, password: &str, remember: bool) -> Outcome<String> {
        let form = LoginForm {
            email: email.to_string(),
            password: password.to_string(),
            remember,
        };
        self.authenticate(&form).await
    }

    /// Validate the form first; an invalid form issues no request and leaves
    /// the session untouched.
    pub async fn login_form(&self, form: &LoginForm) -> Result<Outcome<String>, ValidationErrors> {
        form.validate()?;
        Ok(self.authenticate(form).await)
    }

    async fn authenticate(&self, form: &LoginForm) -> Outcome<String> {
        self.dispatch(SessionAction::Login(Outcome::Pending));

        let client = self.adapter.client();
        let result = async {
            let request = client.build_login(&form.credentials())?;
            let response = self.adapter.execute(request).await?;
            client.parse_login(response)
        }
        .await;

        let outcome = match result {
            Ok(reply) => match self.credentials().persist(&reply.token, form.remember) {
                Ok(()) => {
                    info!(remember = form.remember, "logged in");
                    Outcome::Ok(reply.token)
                }
                Err(e) => {
                    warn!(error = %e, "failed to store token");
                    Outcome::Err(LOGIN_FAILED.to_string())
                }
            },
            Err(e) => {
                warn!(error = %e, "login failed");
                Outcome::Err(e.display_message(LOGIN_FAILED))
            }
        };
        self.dispatch(SessionAction::Login(outcome.clone()));
        outcome
    }

    /// Drop the token everywhere. Local only; never fails.
    pub fn logout(&self) {
        if let Err(e) = self.credentials().clear() {
            warn!(error = %e, "failed to clear stored credentials");
        }
        self.dispatch(SessionAction::Logout);
        info!("logged out");
    }

    pub fn clear_error(&self) {
        self.dispatch(SessionAction::ClearError);
    }

    /// Re-read the token from the credential store, as a fresh start would.
    /// Picks up a forced sign-out performed by the adapter.
    pub fn reload(&self) {
        self.dispatch(SessionAction::Restore(self.credentials().token()));
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("phase", &self.state.borrow().phase())
            .finish_non_exhaustive()
    }
}
