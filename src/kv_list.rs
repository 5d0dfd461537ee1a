/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! An ordered list of key/value byte-string pairs, as used for headers and query parameters.

use crate::bytestring::ByteString;

/// An owned key/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kv {
    /// The entry's key.
    pub key: ByteString,
    /// The entry's value.
    pub value: ByteString,
}

/// An ordered sequence of [`Kv`] entries, preserving insertion order until [`KvList::sorted`]
/// is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvList {
    entries: Vec<Kv>,
}

impl KvList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a deep copy of `key`/`value` as a new trailing entry.
    pub fn add(&mut self, key: impl Into<ByteString>, value: impl Into<ByteString>) {
        self.entries.push(Kv {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in their current order.
    pub fn iter(&self) -> impl Iterator<Item = &Kv> {
        self.entries.iter()
    }

    /// Returns a mutable reference to the most recently added entry, if any.
    pub fn last_mut(&mut self) -> Option<&mut Kv> {
        self.entries.last_mut()
    }

    /// Finds the first entry whose key matches `name` case-insensitively (ASCII). A miss is not
    /// an error.
    pub fn find(&self, name: &[u8]) -> Option<&Kv> {
        self.entries
            .iter()
            .find(|kv| kv.key.as_bytes().eq_ignore_ascii_case(name))
    }

    /// Removes every entry whose key exactly (case-sensitively) equals `name`, preserving the
    /// order of what remains.
    pub fn del(&mut self, name: &[u8]) {
        self.entries.retain(|kv| kv.key.as_bytes() != name);
    }

    /// Returns a deep copy of this list.
    pub fn dup(&self) -> Self {
        self.clone()
    }

    /// Returns a new list sorted by key using a stable, byte-wise ASCII comparison -- entries
    /// with equal keys keep their relative (insertion) order.
    pub fn sorted(&self) -> Self {
        let mut copy = self.clone();
        copy.entries.sort_by(|a, b| a.key.as_bytes().cmp(b.key.as_bytes()));
        copy
    }
}

impl<'a> IntoIterator for &'a KvList {
    type Item = &'a Kv;
    type IntoIter = std::slice::Iter<'a, Kv>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv_list(pairs: &[(&str, &str)]) -> KvList {
        let mut lst = KvList::new();
        for (k, v) in pairs {
            lst.add(*k, *v);
        }
        lst
    }

    #[test]
    fn sorted_is_a_permutation_and_stable_on_ties() {
        let lst = kv_list(&[("b", "1"), ("a", "1"), ("a", "2"), ("c", "1"), ("a", "3")]);
        let sorted = lst.sorted();
        assert_eq!(sorted.len(), lst.len());
        // All three "a" entries must appear, in their original relative order: 1, 2, 3.
        let a_values: Vec<&str> = sorted
            .iter()
            .filter(|kv| kv.key.as_bytes() == b"a")
            .map(|kv| std::str::from_utf8(kv.value.as_bytes()).unwrap())
            .collect();
        assert_eq!(a_values, vec!["1", "2", "3"]);
    }

    #[test]
    fn find_is_case_insensitive() {
        let lst = kv_list(&[("Content-Type", "text/plain")]);
        assert!(lst.find(b"content-type").is_some());
        assert!(lst.find(b"CONTENT-TYPE").is_some());
        assert!(lst.find(b"x-missing").is_none());
    }

    #[test]
    fn del_removes_every_exact_match() {
        let mut lst = kv_list(&[("a", "1"), ("b", "1"), ("a", "2")]);
        lst.del(b"a");
        assert_eq!(lst.len(), 1);
        assert_eq!(lst.iter().next().unwrap().key.as_bytes(), b"b");
    }

    #[test]
    fn del_is_case_sensitive() {
        let mut lst = kv_list(&[("A", "1")]);
        lst.del(b"a");
        assert_eq!(lst.len(), 1, "lowercase `a` must not delete uppercase `A`");
    }

    #[test]
    fn dup_is_a_deep_independent_copy() {
        let lst = kv_list(&[("a", "1")]);
        let mut dup = lst.dup();
        dup.add("b", "2");
        assert_eq!(lst.len(), 1);
        assert_eq!(dup.len(), 2);
    }
}
