//! Error types for remote store operations
//!
//! The backend reports failures as a code (Postgres SQLSTATE or REST
//! gateway code) plus a free-text message. Classification looks at the code
//! first and falls back to matching well-known message fragments.

use std::fmt;

use thiserror::Error;

/// Coarse failure category, used to pick a recovery action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// Row-level security or privilege check refused the write
    PermissionDenied,
    /// Session missing or expired
    Unauthenticated,
    Network,
    NotFound,
    UniqueViolation,
    Other,
}

/// What the user should be offered after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    Retry,
    Reauthenticate,
    OpenDocumentation,
    None,
}

impl RecoveryAction {
    pub fn hint(&self) -> &'static str {
        match self {
            RecoveryAction::Retry => "check your connection and try again",
            RecoveryAction::Reauthenticate => "sign in again",
            RecoveryAction::OpenDocumentation => "see the access policy documentation",
            RecoveryAction::None => "",
        }
    }
}

const PERMISSION_CODES: &[&str] = &["42501"];
const UNAUTHENTICATED_CODES: &[&str] = &["PGRST301", "PGRST302", "401"];
const NOT_FOUND_CODES: &[&str] = &["PGRST116", "404"];
const UNIQUE_CODES: &[&str] = &["23505"];

const PERMISSION_FRAGMENTS: &[&str] = &["row-level security", "permission denied", "not authorized"];
const UNAUTHENTICATED_FRAGMENTS: &[&str] = &["jwt expired", "invalid jwt", "not authenticated"];
const NETWORK_FRAGMENTS: &[&str] = &[
    "network",
    "failed to fetch",
    "timeout",
    "timed out",
    "connection",
];
const NOT_FOUND_FRAGMENTS: &[&str] = &["not found", "no rows"];
const UNIQUE_FRAGMENTS: &[&str] = &["duplicate key", "unique constraint", "already exists"];

impl RemoteErrorKind {
    pub fn classify(code: Option<&str>, message: &str) -> Self {
        if let Some(code) = code {
            let by_code = [
                (PERMISSION_CODES, RemoteErrorKind::PermissionDenied),
                (UNAUTHENTICATED_CODES, RemoteErrorKind::Unauthenticated),
                (NOT_FOUND_CODES, RemoteErrorKind::NotFound),
                (UNIQUE_CODES, RemoteErrorKind::UniqueViolation),
            ];
            if let Some((_, kind)) = by_code.iter().find(|(codes, _)| codes.contains(&code)) {
                return *kind;
            }
        }

        let message = message.to_ascii_lowercase();
        let by_message = [
            (PERMISSION_FRAGMENTS, RemoteErrorKind::PermissionDenied),
            (UNAUTHENTICATED_FRAGMENTS, RemoteErrorKind::Unauthenticated),
            (UNIQUE_FRAGMENTS, RemoteErrorKind::UniqueViolation),
            (NOT_FOUND_FRAGMENTS, RemoteErrorKind::NotFound),
            (NETWORK_FRAGMENTS, RemoteErrorKind::Network),
        ];
        by_message
            .iter()
            .find(|(fragments, _)| fragments.iter().any(|f| message.contains(f)))
            .map(|(_, kind)| *kind)
            .unwrap_or(RemoteErrorKind::Other)
    }

    pub fn recovery(&self) -> RecoveryAction {
        match self {
            RemoteErrorKind::Network => RecoveryAction::Retry,
            RemoteErrorKind::Unauthenticated => RecoveryAction::Reauthenticate,
            RemoteErrorKind::PermissionDenied => RecoveryAction::OpenDocumentation,
            RemoteErrorKind::NotFound
            | RemoteErrorKind::UniqueViolation
            | RemoteErrorKind::Other => RecoveryAction::None,
        }
    }

    /// Only transport failures are worth repeating unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteErrorKind::Network)
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RemoteErrorKind::PermissionDenied => "permission denied",
            RemoteErrorKind::Unauthenticated => "not signed in",
            RemoteErrorKind::Network => "network error",
            RemoteErrorKind::NotFound => "not found",
            RemoteErrorKind::UniqueViolation => "already exists",
            RemoteErrorKind::Other => "request failed",
        };
        f.write_str(label)
    }
}

/// A failed store request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub code: Option<String>,
    pub message: String,
}

impl RemoteError {
    /// Build from a raw backend response, classifying it
    pub fn from_response(code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: RemoteErrorKind::classify(code, &message),
            code: code.map(String::from),
            message,
        }
    }

    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_response(Some("PGRST116"), message)
    }

    pub fn recovery(&self) -> RecoveryAction {
        self.kind.recovery()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
