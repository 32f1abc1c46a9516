//! Time window predicate over exchange timestamps

use serde::{Deserialize, Serialize};

/// Inclusive `[after, before]` bound on ISO-8601 timestamps
///
/// Bounds are compared as strings, not parsed: `"2025-03-01T08:00:00Z"`
/// satisfies `after = "2025-03-01"` but not `before = "2025-03-01"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFilter {
    pub after: Option<String>,
    pub before: Option<String>,
}

impl TimeFilter {
    pub fn new(after: Option<String>, before: Option<String>) -> Self {
        Self { after, before }
    }

    /// Whether any bound is set
    pub fn is_active(&self) -> bool {
        self.after.is_some() || self.before.is_some()
    }

    pub fn matches(&self, timestamp: &str) -> bool {
        if let Some(after) = &self.after {
            if timestamp < after.as_str() {
                return false;
            }
        }
        if let Some(before) = &self.before {
            if timestamp > before.as_str() {
                return false;
            }
        }
        true
    }
}
