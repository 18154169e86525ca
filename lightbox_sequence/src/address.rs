// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path addresses into nested collections.

use core::fmt;
use core::ops::Deref;

use smallvec::SmallVec;

/// An ordered sequence of indices locating a resource inside a nested collection.
///
/// The length of an address is the nesting depth at the addressed point: a
/// flat list is addressed by `[i]`, a list of lists by `[outer, inner]`, and a
/// single resource by the empty address.
///
/// Addresses order lexicographically, which for addresses of the same depth
/// is exactly the depth-first reading order of the collection they were
/// produced from.
///
/// ```rust
/// use lightbox_sequence::PathAddress;
///
/// let a = PathAddress::from([0, 4]);
/// let b = PathAddress::from([1, 0]);
/// assert!(a < b);
/// assert_eq!(a.appending(7).as_slice(), &[0, 4, 7]);
/// assert_eq!(b.suffix(1).as_slice(), &[0]);
/// ```
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathAddress(SmallVec<[usize; 4]>);

impl PathAddress {
    /// The empty address, which names a single resource at depth zero.
    pub const ROOT: Self = Self(SmallVec::new_const());

    /// Creates an address from a slice of indices.
    pub fn new(indices: &[usize]) -> Self {
        Self(SmallVec::from_slice(indices))
    }

    /// Returns the indices of this address.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Returns the first index and the remainder, or `None` for the empty address.
    pub fn split_first(&self) -> Option<(usize, &[usize])> {
        self.0.split_first().map(|(first, rest)| (*first, rest))
    }

    /// Returns a copy of this address with `index` appended.
    #[must_use]
    pub fn appending(&self, index: usize) -> Self {
        let mut out = self.clone();
        out.0.push(index);
        out
    }

    /// Returns a copy of this address with every index of `tail` appended.
    #[must_use]
    pub fn concat(&self, tail: &[usize]) -> Self {
        let mut out = self.clone();
        out.0.extend_from_slice(tail);
        out
    }

    /// Returns the last `n` indices (the whole address if it is shorter).
    #[must_use]
    pub fn suffix(&self, n: usize) -> Self {
        let start = self.0.len().saturating_sub(n);
        Self::new(&self.0[start..])
    }

    /// Returns this address without its last `n` indices (empty if it is shorter).
    #[must_use]
    pub fn drop_last(&self, n: usize) -> Self {
        let end = self.0.len().saturating_sub(n);
        Self::new(&self.0[..end])
    }

    pub(crate) fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl Deref for PathAddress {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<&[usize]> for PathAddress {
    fn from(indices: &[usize]) -> Self {
        Self::new(indices)
    }
}

impl<const N: usize> From<[usize; N]> for PathAddress {
    fn from(indices: [usize; N]) -> Self {
        Self::new(&indices)
    }
}

impl From<Vec<usize>> for PathAddress {
    fn from(indices: Vec<usize>) -> Self {
        Self(SmallVec::from_vec(indices))
    }
}

impl FromIterator<usize> for PathAddress {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Debug for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_like_reading_order() {
        let mut addresses = vec![
            PathAddress::from([1, 0]),
            PathAddress::from([0, 4]),
            PathAddress::from([0, 0]),
            PathAddress::from([1, 2]),
        ];
        addresses.sort();
        assert_eq!(
            addresses,
            vec![
                PathAddress::from([0, 0]),
                PathAddress::from([0, 4]),
                PathAddress::from([1, 0]),
                PathAddress::from([1, 2]),
            ]
        );
    }

    #[test]
    fn suffix_and_drop_last_saturate() {
        let a = PathAddress::from([3, 1, 4]);
        assert_eq!(a.suffix(2).as_slice(), &[1, 4]);
        assert_eq!(a.suffix(9), a);
        assert_eq!(a.drop_last(1).as_slice(), &[3, 1]);
        assert_eq!(a.drop_last(9), PathAddress::ROOT);
    }

    #[test]
    fn split_first_walks_the_path() {
        let a = PathAddress::from([2, 5]);
        assert_eq!(a.split_first(), Some((2, &[5][..])));
        assert_eq!(PathAddress::ROOT.split_first(), None);
    }

    #[test]
    fn displays_as_list() {
        assert_eq!(PathAddress::from([0, 2]).to_string(), "[0, 2]");
        assert_eq!(format!("{:?}", PathAddress::ROOT), "[]");
    }
}
