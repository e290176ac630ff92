//! Local form validation. Nothing here touches the network: a form that
//! fails validation never becomes a request.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::{LoginRequest, NewUser};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .unwrap_or_else(|e| panic!("email pattern is invalid: {e}"))
});

const MIN_NAME_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All field errors of one form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", join(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First message reported for `field`.
    pub fn message(&self, field: &str) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(ValidationError { field, message });
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn check_email(errors: &mut ValidationErrors, value: &str) {
    if value.trim().is_empty() {
        errors.push("email", "Email is required");
    } else if !EMAIL.is_match(value.trim()) {
        errors.push("email", "Invalid email format");
    }
}

fn check_name(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    let (required, too_short) = match field {
        "first_name" => (
            "First name is required",
            "First name must be at least 2 characters",
        ),
        _ => (
            "Last name is required",
            "Last name must be at least 2 characters",
        ),
    };
    if value.is_empty() {
        errors.push(field, required);
    } else if value.chars().count() < MIN_NAME_LEN {
        errors.push(field, too_short);
    }
}

fn check_url(errors: &mut ValidationErrors, value: &str) {
    if value.trim().is_empty() {
        errors.push("avatar", "Profile image link is required");
        return;
    }
    let valid = Url::parse(value.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false);
    if !valid {
        errors.push("avatar", "Must be a valid URL");
    }
}

/// Login form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        }
        errors.into_result()
    }

    pub fn credentials(&self) -> LoginRequest {
        LoginRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

/// Create/edit form input for a user record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar: String,
}

impl UserForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_name(&mut errors, "first_name", &self.first_name);
        check_name(&mut errors, "last_name", &self.last_name);
        check_email(&mut errors, &self.email);
        check_url(&mut errors, &self.avatar);
        errors.into_result()
    }

    /// The API only accepts `{name, job}`; the email travels as the job.
    pub fn payload(&self) -> NewUser {
        NewUser {
            name: format!("{} {}", self.first_name.trim(), self.last_name.trim()),
            job: self.email.trim().to_string(),
        }
    }
}

impl From<&crate::types::UserRecord> for UserForm {
    fn from(user: &crate::types::UserRecord) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
        }
    }
}
