//! `AssociationSet`: the ids attached to a parent entity.

use serde::{Deserialize, Serialize};

use crate::slice;

/// An unordered, duplicate-free collection of association ids.
///
/// Insertion order is kept for stable output (writes, logs, binding ids),
/// but equality ignores it. Collecting from an iterator keeps the first
/// occurrence of each id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AssociationSet(Vec<String>);

impl AssociationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|x| x == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Elements of `other` not in `self`.
    pub fn right_only(&self, other: &AssociationSet) -> AssociationSet {
        AssociationSet(slice::right_only_difference(&self.0, &other.0))
    }

    /// Elements in exactly one of `self` and `other`.
    pub fn symmetric_difference(&self, other: &AssociationSet) -> AssociationSet {
        AssociationSet(slice::symmetric_difference(&self.0, &other.0))
    }

    /// `self` without the elements of `other`, order preserved.
    pub fn subtract(&self, other: &AssociationSet) -> AssociationSet {
        AssociationSet(slice::subtract(&self.0, &other.0))
    }

    pub fn union(&self, other: &AssociationSet) -> AssociationSet {
        AssociationSet(slice::union(&self.0, &other.0))
    }
}

impl PartialEq for AssociationSet {
    fn eq(&self, other: &Self) -> bool {
        slice::unordered_equal(&self.0, &other.0)
    }
}

impl Eq for AssociationSet {}

impl From<Vec<String>> for AssociationSet {
    fn from(ids: Vec<String>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<AssociationSet> for Vec<String> {
    fn from(set: AssociationSet) -> Self {
        set.0
    }
}

impl FromIterator<String> for AssociationSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut ids: Vec<String> = Vec::new();
        for id in iter {
            if !slice::contains(&ids, &id) {
                ids.push(id);
            }
        }
        AssociationSet(ids)
    }
}

impl<'a> FromIterator<&'a str> for AssociationSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}

impl IntoIterator for AssociationSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AssociationSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
