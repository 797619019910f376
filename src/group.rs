//! Invalidation groups.
//!
//! A mutation often invalidates more than one derived view: editing an item
//! stales the single-item cache, the collection cache, and any query-result
//! caches referencing it. An [`InvalidationGroup`] names that set once, so
//! every mutation site evicts the same caches instead of stacking ad-hoc
//! eviction calls.

use std::collections::BTreeSet;

/// A named, static set of cache names evicted together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationGroup {
    name: String,
    members: BTreeSet<String>,
}

impl InvalidationGroup {
    /// Create an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeSet::new(),
        }
    }

    /// Add a member cache name (builder pattern). Duplicates collapse.
    #[must_use]
    pub fn member(mut self, cache_name: impl Into<String>) -> Self {
        self.members.insert(cache_name.into());
        self
    }

    /// The group's name, used in eviction logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member cache names, in deterministic order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    /// Whether the group lists a given cache name.
    pub fn contains(&self, cache_name: &str) -> bool {
        self.members.contains(cache_name)
    }

    /// Number of member caches.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_deduplicate() {
        let group = InvalidationGroup::new("item_mutations")
            .member("itemCache")
            .member("itemAllCache")
            .member("itemCache");

        assert_eq!(group.len(), 2);
        assert!(group.contains("itemCache"));
        assert!(group.contains("itemAllCache"));
        assert!(!group.contains("itemSearchCache"));
    }

    #[test]
    fn test_members_iterate_in_order() {
        let group = InvalidationGroup::new("g")
            .member("b")
            .member("a");
        let members: Vec<_> = group.members().collect();
        assert_eq!(members, vec!["a", "b"]);
    }
}
