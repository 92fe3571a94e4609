//! Cache keys

use serde::Serialize;
use std::fmt;

/// One segment of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySegment {
    /// A fixed name such as `events` or `my-tickets`
    Name(String),
    /// A record id
    Id(u64),
    /// Serialized query parameters
    Params(String),
}

impl KeySegment {
    /// A segment for a parameter set, compared by its JSON encoding.
    #[must_use]
    pub fn params<P: Serialize>(params: &P) -> Self {
        Self::Params(serde_json::to_string(params).unwrap_or_default())
    }
}

impl From<&str> for KeySegment {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<u64> for KeySegment {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Id(id) => write!(f, "{id}"),
            Self::Params(params) => f.write_str(params),
        }
    }
}

/// A hierarchical cache key, e.g. `["tickets", "my-tickets"]`.
///
/// Invalidation matches by prefix: `["tickets"]` covers every ticket query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    /// Build a key from segments.
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<KeySegment>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Append a segment.
    #[must_use]
    pub fn with(mut self, segment: impl Into<KeySegment>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// The segments.
    #[must_use]
    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// Whether `prefix` is a prefix of this key. The empty key matches all.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{segment}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matching_respects_segment_kinds() {
        let ticket = QueryKey::new(["tickets"]).with(5_u64);
        let mine = QueryKey::new(["tickets", "my-tickets"]);

        assert!(ticket.starts_with(&QueryKey::new(["tickets"])));
        assert!(mine.starts_with(&QueryKey::new(["tickets"])));
        assert!(!mine.starts_with(&QueryKey::new(["tickets"]).with(5_u64)));
        assert!(!QueryKey::new(["tickets", "5"]).starts_with(&ticket));
        assert!(mine.starts_with(&QueryKey::default()));
    }

    #[test]
    fn params_compare_by_encoding() {
        #[derive(Serialize)]
        struct Filters {
            page: u32,
        }
        let a = QueryKey::new(["events"]).with(KeySegment::params(&Filters { page: 1 }));
        let b = QueryKey::new(["events"]).with(KeySegment::params(&Filters { page: 1 }));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), r#"[events, {"page":1}]"#);
    }
}
