//! Property results and the checker trait.

use std::fmt;

/// Outcome of checking a single property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyResult {
    /// Property name (e.g. `"NoLostElements"`).
    pub name: &'static str,
    /// Whether the property holds.
    pub holds: bool,
    /// Explanation of the violation, if any.
    pub violation: Option<String>,
}

impl PropertyResult {
    /// A property that holds.
    #[must_use]
    pub fn pass(name: &'static str) -> Self {
        Self {
            name,
            holds: true,
            violation: None,
        }
    }

    /// A violated property.
    #[must_use]
    pub fn fail(name: &'static str, violation: impl Into<String>) -> Self {
        Self {
            name,
            holds: false,
            violation: Some(violation.into()),
        }
    }
}

impl fmt::Display for PropertyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.violation {
            None => write!(f, "[PASS] {}", self.name),
            Some(violation) => write!(f, "[FAIL] {}: {}", self.name, violation),
        }
    }
}

/// Something that can verify a set of properties.
pub trait PropertyChecker {
    /// Check every property and return one result per property.
    fn check_all(&self) -> Vec<PropertyResult>;

    /// True when every property holds.
    fn all_hold(&self) -> bool {
        self.check_all().iter().all(|r| r.holds)
    }

    /// The first violated property, if any.
    fn first_violation(&self) -> Option<PropertyResult> {
        self.check_all().into_iter().find(|r| !r.holds)
    }
}
