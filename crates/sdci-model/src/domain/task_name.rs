use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of a pre-registered task script.
///
/// A name is a single path component: it can never escape the tasks directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskName(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskNameError {
    #[error("task name is empty")]
    Empty,
    #[error("task name must not start with '.': {0}")]
    Hidden(String),
    #[error("task name contains a forbidden character: {0}")]
    Forbidden(String),
}

impl TaskName {
    pub fn new(raw: impl Into<String>) -> Result<Self, TaskNameError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(TaskNameError::Empty);
        }
        if raw.starts_with('.') {
            return Err(TaskNameError::Hidden(raw));
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
        if !raw.chars().all(allowed) {
            return Err(TaskNameError::Forbidden(raw));
        }
        Ok(Self(raw))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TaskName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskName {
    type Error = TaskNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TaskName {
    type Error = TaskNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskName> for String {
    fn from(name: TaskName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        for raw in ["deploy", "build-web", "db_migrate", "release.v2"] {
            let name = TaskName::new(raw).unwrap();
            assert_eq!(name.as_str(), raw);
        }
    }

    #[test]
    fn rejects_path_traversal() {
        assert!(matches!(
            TaskName::new("../etc/passwd"),
            Err(TaskNameError::Hidden(_))
        ));
        assert!(matches!(
            TaskName::new("nested/deploy"),
            Err(TaskNameError::Forbidden(_))
        ));
        assert!(matches!(
            TaskName::new("a\\b"),
            Err(TaskNameError::Forbidden(_))
        ));
    }

    #[test]
    fn rejects_empty_and_hidden() {
        assert_eq!(TaskName::new(""), Err(TaskNameError::Empty));
        assert!(matches!(TaskName::new(".env"), Err(TaskNameError::Hidden(_))));
    }

    #[test]
    fn deserialize_validates() {
        let ok: TaskName = serde_json::from_str(r#""deploy""#).unwrap();
        assert_eq!(ok.to_string(), "deploy");

        let bad = serde_json::from_str::<TaskName>(r#""../x""#);
        assert!(bad.is_err());
    }
}
