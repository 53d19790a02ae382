// safefn/src/validation/issue.rs

//! Structured diagnostics carried by validation failures.

use std::fmt;

/// One step of the path leading to an offending value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
  Key(String),
  Index(usize),
}

impl fmt::Display for PathSegment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PathSegment::Key(key) => write!(f, "{}", key),
      PathSegment::Index(idx) => write!(f, "[{}]", idx),
    }
  }
}

/// A single validation problem. An empty `path` means the issue concerns the
/// value as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
  pub message: String,
  pub path: Vec<PathSegment>,
}

impl ValidationIssue {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      path: Vec::new(),
    }
  }

  pub fn at_key(mut self, key: impl Into<String>) -> Self {
    self.path.push(PathSegment::Key(key.into()));
    self
  }

  pub fn at_index(mut self, index: usize) -> Self {
    self.path.push(PathSegment::Index(index));
    self
  }

  /// Dotted rendering of the path, e.g. `items[2].sku`. `None` without a path.
  pub fn path_string(&self) -> Option<String> {
    if self.path.is_empty() {
      return None;
    }
    let mut out = String::new();
    for segment in &self.path {
      match segment {
        PathSegment::Key(key) => {
          if !out.is_empty() {
            out.push('.');
          }
          out.push_str(key);
        }
        PathSegment::Index(_) => out.push_str(&segment.to_string()),
      }
    }
    Some(out)
  }
}

impl fmt::Display for ValidationIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.path_string() {
      Some(path) => write!(f, "{}: {}", path, self.message),
      None => write!(f, "{}", self.message),
    }
  }
}

/// What was being validated when a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationTarget {
  Input,
  Argument(usize),
  Output,
}

impl fmt::Display for ValidationTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationTarget::Input => write!(f, "input"),
      ValidationTarget::Argument(idx) => write!(f, "argument {}", idx),
      ValidationTarget::Output => write!(f, "output"),
    }
  }
}

pub(crate) fn render_issues(issues: &[ValidationIssue]) -> String {
  issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
