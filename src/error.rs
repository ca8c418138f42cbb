//! Error types for binding reconciliation and the Looker API collaborator.

use std::fmt;

use thiserror::Error;

/// Main error type for binding operations
#[derive(Error, Debug)]
pub enum BindingError {
    /// The parent entity (role, user, group) does not exist remotely
    #[error("{kind} with id {id} cannot be found")]
    NotFound { kind: &'static str, id: String },

    /// A remote record came back without an identifier
    #[error("the {parent_kind} '{parent_id}' has a {kind} with a missing id")]
    MissingId {
        parent_kind: &'static str,
        parent_id: String,
        kind: &'static str,
    },

    /// Non-success response from the Looker API
    #[error("looker api returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure talking to the Looker API
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Login with client credentials failed
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Invalid value for a named configuration field
    #[error("invalid config for '{0}': {1}")]
    InvalidConfig(String, String),

    /// A binding declaration or binding id failed validation
    #[error("invalid binding: {0}")]
    InvalidBinding(String),

    /// One or more per-element writes failed
    #[error(transparent)]
    Write(WriteErrors),
}

impl BindingError {
    /// True when the error means the parent entity no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BindingError::NotFound { .. })
    }
}

/// Result type alias for binding operations
pub type Result<T> = std::result::Result<T, BindingError>;

/// Failures collected across independent per-element writes.
///
/// Every element is attempted; each failure is kept alongside the element
/// it belongs to so callers can report all of them at once.
#[derive(Debug, Default)]
pub struct WriteErrors {
    failures: Vec<(String, BindingError)>,
}

impl WriteErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the failure of the write for `element`.
    pub fn push(&mut self, element: impl Into<String>, error: BindingError) {
        self.failures.push((element.into(), error));
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// The first failure in attempt order.
    pub fn first(&self) -> Option<(&str, &BindingError)> {
        self.failures.first().map(|(el, err)| (el.as_str(), err))
    }

    /// All failures in attempt order.
    pub fn all(&self) -> &[(String, BindingError)] {
        &self.failures
    }

    /// `Ok(())` when nothing failed, otherwise the aggregate as a [`BindingError::Write`].
    pub fn into_result(self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(BindingError::Write(self))
        }
    }
}

impl fmt::Display for WriteErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} write(s) failed", self.failures.len())?;
        for (element, err) in &self.failures {
            write!(f, "\n  * {}: {}", element, err)?;
        }
        Ok(())
    }
}

impl std::error::Error for WriteErrors {}
