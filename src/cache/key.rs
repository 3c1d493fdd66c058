//! Canonical request keys.

use std::collections::BTreeMap;
use std::fmt;

/// Identifies a cacheable/deduplicable backend operation.
///
/// Parameters are held in a sorted map, so two keys built with the same
/// parameters in a different order compare and hash equal.
///
/// ```rust
/// # use mimir::cache::RequestKey;
/// let a = RequestKey::new("documents").param("document_type", 3).param("page", 1);
/// let b = RequestKey::new("documents").param("page", 1).param("document_type", 3);
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "documents?document_type=3&page=1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    endpoint: &'static str,
    params: BTreeMap<String, String>,
}

impl RequestKey {
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter. A repeated name replaces the earlier value.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn order_independent_equality_and_hash() {
        let a = RequestKey::new("quiz").param("doc", 1).param("filter", "all");
        let b = RequestKey::new("quiz").param("filter", "all").param("doc", 1);
        let set: HashSet<_> = [a.clone(), b.clone()].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn differs_on_endpoint_and_value() {
        let base = RequestKey::new("summary").param("doc", 1);
        assert_ne!(base, RequestKey::new("quiz").param("doc", 1));
        assert_ne!(base, RequestKey::new("summary").param("doc", 2));
    }

    #[test]
    fn display_without_params() {
        assert_eq!(RequestKey::new("document_types").to_string(), "document_types");
    }
}
