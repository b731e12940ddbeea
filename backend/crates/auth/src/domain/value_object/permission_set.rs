//! Effective permission set of one user, keyed by permission name.

use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Ordered, duplicate-free set of permission names
///
/// Keeps first-occurrence order so the same inputs always produce the same
/// sequence, while membership checks stay O(1).
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    ordered: Vec<String>,
    index: HashSet<String>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of role-derived and directly granted names, role-derived first
    pub fn merge<I, J>(role_derived: I, direct: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        role_derived.into_iter().chain(direct).collect()
    }

    /// Returns false when the name was already present
    pub fn insert(&mut self, name: String) -> bool {
        if self.index.contains(&name) {
            return false;
        }
        self.index.insert(name.clone());
        self.ordered.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

impl PartialEq for PermissionSet {
    fn eq(&self, other: &Self) -> bool {
        self.ordered == other.ordered
    }
}

impl Eq for PermissionSet {}

impl FromIterator<String> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl<'a> FromIterator<&'a str> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_collapses_duplicates_keeping_first_occurrence() {
        let set = PermissionSet::merge(
            names(&["edit-users", "view-users"]),
            names(&["view-home", "view-users"]),
        );
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec!["edit-users", "view-users", "view-home"]
        );
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = PermissionSet::merge(names(&["a", "b"]), names(&["b", "c"]));
        let twice = PermissionSet::merge(once.clone().into_vec(), once.clone().into_vec());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_membership_does_not_depend_on_source() {
        let from_roles = PermissionSet::merge(names(&["view-users"]), Vec::new());
        let direct = PermissionSet::merge(Vec::new(), names(&["view-users"]));
        assert!(from_roles.contains("view-users"));
        assert!(direct.contains("view-users"));
        assert!(!direct.contains("edit-users"));
    }

    #[test]
    fn test_serializes_as_array() {
        let set: PermissionSet = ["view-home", "view-users"].into_iter().collect();
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            serde_json::json!(["view-home", "view-users"])
        );
    }
}
