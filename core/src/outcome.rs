//! Operation outcomes and request sequencing.
//!
//! Every network operation moves through `Outcome::Pending` and ends in
//! `Ok(value)` or `Err(message)`. The managers feed these to their pure
//! `reduce` functions, so a state transition never depends on the future
//! that produced it.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;

use crate::error::ApiError;

/// Tagged three-state result of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Pending,
    Ok(T),
    Err(String),
}

impl<T> Outcome<T> {
    /// Settle a finished call; failures carry the server message or
    /// `fallback`.
    pub fn settle(result: Result<T, ApiError>, fallback: &str) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(e) => Outcome::Err(e.display_message(fallback)),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Err(message) => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Pending => Outcome::Pending,
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Err(message) => Outcome::Err(message),
        }
    }
}

/// How results of overlapping requests of the same kind are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOrdering {
    /// Only the most recently issued request may update state.
    #[default]
    LatestIssued,
    /// Every result is applied as it arrives; a slow stale response can
    /// overwrite a newer one.
    ArrivalOrder,
}

/// Monotonic ticket counter for one operation kind.
#[derive(Debug, Default)]
pub struct Sequencer {
    issued: AtomicU64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket
    }

    /// Whether a result carrying `ticket` may be applied under `ordering`.
    pub fn accepts(&self, ordering: FetchOrdering, ticket: u64) -> bool {
        match ordering {
            FetchOrdering::ArrivalOrder => true,
            FetchOrdering::LatestIssued => self.is_latest(ticket),
        }
    }
}
