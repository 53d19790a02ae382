// safefn/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::validation::issue::{render_issues, ValidationIssue, ValidationTarget};

/// Every failure a safe function can surface to its caller.
///
/// The engine does not distinguish between variants when deciding whether to
/// consult an error handler: all of them reach the recovery boundary.
#[derive(Debug, Error)]
pub enum SafeFnError {
  #[error("{target} failed validation: {}", render_issues(.issues))]
  Validation {
    target: ValidationTarget,
    issues: Vec<ValidationIssue>,
  },

  #[error("Configuration error: {message}")]
  Configuration { message: String },

  /// Anything raised by user-supplied middleware or handler logic.
  /// Displays as the wrapped error so messages reach the caller unchanged.
  #[error("{source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },

  #[error("No safe function registered under '{name}'")]
  NotRegistered { name: String },
}

impl SafeFnError {
  pub fn configuration(message: impl Into<String>) -> Self {
    SafeFnError::Configuration {
      message: message.into(),
    }
  }

  /// Wraps an arbitrary message as a handler failure.
  pub fn handler(message: impl std::fmt::Display) -> Self {
    SafeFnError::Handler {
      source: anyhow::anyhow!("{}", message),
    }
  }

  pub fn is_validation(&self) -> bool {
    matches!(self, SafeFnError::Validation { .. })
  }

  pub fn is_configuration(&self) -> bool {
    matches!(self, SafeFnError::Configuration { .. })
  }

  /// The structured issues of a validation failure, if this is one.
  pub fn issues(&self) -> Option<&[ValidationIssue]> {
    match self {
      SafeFnError::Validation { issues, .. } => Some(issues),
      _ => None,
    }
  }
}

impl From<AnyhowError> for SafeFnError {
  fn from(err: AnyhowError) -> Self {
    // A SafeFnError that travelled through anyhow is handed back as-is
    // instead of becoming Handler(Handler(...)).
    match err.downcast::<SafeFnError>() {
      Ok(inner) => inner,
      Err(source) => SafeFnError::Handler { source },
    }
  }
}

impl From<serde_json::Error> for SafeFnError {
  fn from(err: serde_json::Error) -> Self {
    SafeFnError::Handler { source: err.into() }
  }
}

pub type SafeFnResult<T, E = SafeFnError> = std::result::Result<T, E>;
