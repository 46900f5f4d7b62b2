//! Violation records produced by meta and display checks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which part of the error taxonomy a violation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCategory {
    /// The display references something that does not exist or conflicts.
    Configuration,
    /// A meta variable's own parameters are invalid.
    Schema,
}

impl ViolationCategory {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ViolationCategory::Configuration => "Configuration",
            ViolationCategory::Schema => "Schema",
        }
    }
}

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub category: ViolationCategory,
    /// What the violation is about: a meta name, "panel", "state", a view name...
    pub subject: String,
    pub message: String,
}

impl Violation {
    pub fn configuration(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: ViolationCategory::Configuration,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn schema(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: ViolationCategory::Schema,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.category == ViolationCategory::Configuration
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}
