//! Subscription patterns.

use std::fmt;

/// What a subscription listens to.
///
/// Parsed from the raw pattern string:
///
/// | string      | pattern              | matches                          |
/// |-------------|----------------------|----------------------------------|
/// | `"*"`       | [`Pattern::Global`]  | every event                      |
/// | `"user.*"`  | [`Pattern::Prefix`]  | types starting with `"user."`    |
/// | anything else | [`Pattern::Exact`] | that type only                   |
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// `"*"`.
    Global,
    /// `"{prefix}.*"`; holds `prefix` without the trailing `".*"`.
    Prefix(String),
    /// A literal event type.
    Exact(String),
}

impl Pattern {
    /// Classify a raw pattern string.
    pub fn parse(raw: &str) -> Self {
        if raw == "*" {
            Self::Global
        } else if let Some(prefix) = raw.strip_suffix(".*") {
            Self::Prefix(prefix.to_string())
        } else {
            Self::Exact(raw.to_string())
        }
    }

    /// Whether an event of `event_type` is delivered under this pattern.
    pub fn matches(&self, event_type: &str) -> bool {
        match self {
            Self::Global => true,
            Self::Prefix(prefix) => event_type
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('.')),
            Self::Exact(exact) => exact == event_type,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("*"),
            Self::Prefix(prefix) => write!(f, "{prefix}.*"),
            Self::Exact(exact) => f.write_str(exact),
        }
    }
}

impl From<&str> for Pattern {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_classifies() {
        assert_eq!(Pattern::parse("*"), Pattern::Global);
        assert_eq!(Pattern::parse("user.*"), Pattern::Prefix("user".into()));
        assert_eq!(Pattern::parse("user.created"), Pattern::Exact("user.created".into()));
        // Only a trailing ".*" makes a prefix.
        assert_eq!(Pattern::parse("user*"), Pattern::Exact("user*".into()));
    }

    #[test]
    fn prefix_requires_dot_boundary() {
        let p = Pattern::parse("user.*");
        assert!(p.matches("user.created"));
        assert!(p.matches("user.profile.updated"));
        assert!(!p.matches("user"));
        assert!(!p.matches("username.changed"));
        assert!(!p.matches("order.created"));
    }

    #[test]
    fn nested_prefix() {
        let p = Pattern::parse("user.profile.*");
        assert!(p.matches("user.profile.updated"));
        assert!(!p.matches("user.created"));
    }

    #[test]
    fn exact_and_global() {
        assert!(Pattern::parse("a.b").matches("a.b"));
        assert!(!Pattern::parse("a.b").matches("a.b.c"));
        assert!(Pattern::Global.matches(""));
        assert!(Pattern::Global.matches("anything.at.all"));
    }

    #[test]
    fn display_round_trips_raw_string() {
        for raw in ["*", "user.*", "user.created"] {
            assert_eq!(Pattern::parse(raw).to_string(), raw);
        }
    }
}
