//! Hierarchical cache keys.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Cache key: resource path (family first) plus sorted parameters.
///
/// `tasks/list?status=todo` and `tasks/list?status=completed` are distinct
/// entries of the `tasks` family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    path: Vec<String>,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    /// Creates the root key of one resource family.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            path: vec![resource.into()],
            params: BTreeMap::new(),
        }
    }

    /// Appends one path segment.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.path.push(segment.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn params<K, V>(self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        params
            .into_iter()
            .fold(self, |key, (name, value)| key.param(name, value))
    }

    /// Resource family name (first path segment).
    pub fn resource(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }

    /// Whether `self` belongs to `family`: `family`'s path is a prefix and all
    /// of its parameters match.
    pub fn starts_with(&self, family: &QueryKey) -> bool {
        self.path.starts_with(&family.path)
            && family
                .params
                .iter()
                .all(|(name, value)| self.params.get(name) == Some(value))
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.join("/"))?;
        let mut separator = '?';
        for (name, value) in &self.params {
            write!(f, "{separator}{name}={value}")?;
            separator = '&';
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::QueryKey;

    #[test]
    fn parameter_order_does_not_matter() {
        let a = QueryKey::new("tasks")
            .segment("list")
            .param("status", "todo")
            .param("limit", "10");
        let b = QueryKey::new("tasks")
            .segment("list")
            .params([("limit", "10"), ("status", "todo")]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "tasks/list?limit=10&status=todo");
    }

    #[test]
    fn distinct_filters_are_distinct_keys() {
        let todo = QueryKey::new("tasks").segment("list").param("status", "todo");
        let done = QueryKey::new("tasks").segment("list").param("status", "completed");
        assert_ne!(todo, done);
    }

    #[test]
    fn family_membership_uses_path_prefix() {
        let family = QueryKey::new("tasks");
        let list = QueryKey::new("tasks").segment("list").param("status", "todo");
        let detail = QueryKey::new("tasks").segment("detail").segment("42");
        let habits = QueryKey::new("habits").segment("list");

        assert!(list.starts_with(&family));
        assert!(detail.starts_with(&family));
        assert!(!habits.starts_with(&family));
        assert!(!family.starts_with(&list));
        assert_eq!(detail.resource(), "tasks");
    }
}
