// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The nested collection abstraction and its flattened reading order.

use crate::{MediaResource, PathAddress, SequenceError};

/// Direction of travel through the flattened reading order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards later addresses (outer index increasing, then inner).
    Forward,
    /// Towards earlier addresses.
    Reverse,
}

/// A possibly nested collection of [`MediaResource`]s.
///
/// A single resource is a sequence of depth zero; a `Vec` of sequences of
/// depth `n` is a sequence of depth `n + 1`. Depth is a property of the type,
/// so every resource in a given sequence lives at the same depth and every
/// address into it has exactly [`DEPTH`](Self::DEPTH) indices.
///
/// The *flattened order* is the depth-first reading order: outer index
/// increasing, then inner. Neighbour queries and wraparound are defined on it.
///
/// ```rust
/// use lightbox_sequence::{MediaKind, MediaResource, PathAddress, ResourceSequence};
///
/// let item = |id: &str| MediaResource::new(id, MediaKind::Image);
/// let albums = vec![vec![item("a"), item("b")], vec![item("c")]];
///
/// assert_eq!(albums.depth(), 2);
/// assert_eq!(albums.get(&[1, 0]).unwrap().id().as_str(), "c");
///
/// let last = PathAddress::from([1, 0]);
/// assert_eq!(albums.next_after(&last, false), None);
/// assert_eq!(albums.next_after(&last, true), Some(PathAddress::from([0, 0])));
/// ```
pub trait ResourceSequence {
    /// Nesting depth; the length of every address into this sequence.
    const DEPTH: usize;

    /// Resolves the remaining `address` segments, where `level` segments were already consumed.
    fn resolve(&self, address: &[usize], level: usize) -> Result<&MediaResource, SequenceError>;

    /// Appends, in reading order, `prefix` extended with the address of every
    /// resource matching `predicate` to `out`.
    ///
    /// When `match_first` is set, enumeration stops as soon as `out` is non-empty.
    fn collect_matches(
        &self,
        predicate: &mut dyn FnMut(&MediaResource) -> bool,
        prefix: &mut PathAddress,
        match_first: bool,
        out: &mut Vec<PathAddress>,
    );

    /// Removes exactly the resource at `address`, returning it.
    ///
    /// Later siblings at the affected depth shift down by one. Returns `None`
    /// if the address does not name a resource.
    fn remove_at(&mut self, address: &[usize]) -> Option<MediaResource>;

    /// Inserts `resource` so that it ends up at `address`, where `level`
    /// segments were already consumed.
    ///
    /// The last index may equal the length of its parent collection to append.
    fn insert_at(
        &mut self,
        address: &[usize],
        level: usize,
        resource: MediaResource,
    ) -> Result<(), SequenceError>;

    /// Total number of resources.
    fn resource_count(&self) -> usize;

    /// Converts a depth-zero sequence back into its resource.
    fn into_resource(self) -> Option<MediaResource>
    where
        Self: Sized;

    /// Wraps a resource as a depth-zero sequence.
    fn from_resource(resource: MediaResource) -> Result<Self, MediaResource>
    where
        Self: Sized;

    /// The nesting depth of this sequence.
    fn depth(&self) -> usize {
        Self::DEPTH
    }

    /// Resolves a resource by exact path traversal.
    fn get(&self, address: &[usize]) -> Result<&MediaResource, SequenceError> {
        self.resolve(address, 0)
    }

    /// Inserts `resource` at `address`.
    ///
    /// Not called `insert`: on a concrete `Vec`, the inherent `Vec::insert`
    /// would shadow it.
    fn insert_resource(
        &mut self,
        address: &[usize],
        resource: MediaResource,
    ) -> Result<(), SequenceError> {
        self.insert_at(address, 0, resource)
    }

    /// Every address whose resource matches `predicate`, in reading order.
    ///
    /// With `match_first` the search short-circuits and returns at most one address.
    fn filter(
        &self,
        mut predicate: impl FnMut(&MediaResource) -> bool,
        match_first: bool,
    ) -> Vec<PathAddress>
    where
        Self: Sized,
    {
        let mut out = Vec::new();
        let mut prefix = PathAddress::ROOT;
        self.collect_matches(&mut predicate, &mut prefix, match_first, &mut out);
        out
    }

    /// The first address whose resource matches `predicate`.
    fn first_address(&self, predicate: impl FnMut(&MediaResource) -> bool) -> Option<PathAddress>
    where
        Self: Sized,
    {
        self.filter(predicate, true).pop()
    }

    /// The address of the resource with the same identity as `resource`.
    fn address_of(&self, resource: &MediaResource) -> Option<PathAddress>
    where
        Self: Sized,
    {
        self.first_address(|candidate| candidate == resource)
    }

    /// Every address, in reading order.
    fn all_addresses(&self) -> Vec<PathAddress>
    where
        Self: Sized,
    {
        self.filter(|_| true, false)
    }

    /// Position of `address` in the flattened order, if it names a resource.
    fn flat_index_of(&self, address: &[usize]) -> Option<usize>
    where
        Self: Sized,
    {
        self.all_addresses()
            .iter()
            .position(|candidate| candidate.as_slice() == address)
    }

    /// The neighbour of `address` in the flattened order.
    ///
    /// With `wrap`, stepping past either end continues from the other end.
    /// Returns `None` past either end without `wrap`, when `address` does not
    /// name a resource (for example after a concurrent removal), or when the
    /// only neighbour is `address` itself.
    fn neighbor(&self, address: &[usize], direction: Direction, wrap: bool) -> Option<PathAddress>
    where
        Self: Sized,
    {
        let mut all = self.all_addresses();
        let len = all.len();
        let origin = all.iter().position(|candidate| candidate.as_slice() == address)?;
        let target = match (direction, wrap) {
            (Direction::Forward, true) => (origin + 1) % len,
            (Direction::Reverse, true) => (origin + len - 1) % len,
            (Direction::Forward, false) => origin.checked_add(1).filter(|i| *i < len)?,
            (Direction::Reverse, false) => origin.checked_sub(1)?,
        };
        if target == origin {
            return None;
        }
        Some(all.swap_remove(target))
    }

    /// The address after `address` in reading order.
    fn next_after(&self, address: &[usize], wrap: bool) -> Option<PathAddress>
    where
        Self: Sized,
    {
        self.neighbor(address, Direction::Forward, wrap)
    }

    /// The address before `address` in reading order.
    fn next_before(&self, address: &[usize], wrap: bool) -> Option<PathAddress>
    where
        Self: Sized,
    {
        self.neighbor(address, Direction::Reverse, wrap)
    }
}

impl ResourceSequence for MediaResource {
    const DEPTH: usize = 0;

    fn resolve(&self, address: &[usize], _level: usize) -> Result<&MediaResource, SequenceError> {
        if address.is_empty() {
            Ok(self)
        } else {
            Err(SequenceError::AddressTooLong {
                extra: address.len(),
            })
        }
    }

    fn collect_matches(
        &self,
        predicate: &mut dyn FnMut(&MediaResource) -> bool,
        prefix: &mut PathAddress,
        _match_first: bool,
        out: &mut Vec<PathAddress>,
    ) {
        if predicate(self) {
            out.push(prefix.clone());
        }
    }

    fn remove_at(&mut self, _address: &[usize]) -> Option<MediaResource> {
        None
    }

    fn insert_at(
        &mut self,
        address: &[usize],
        _level: usize,
        _resource: MediaResource,
    ) -> Result<(), SequenceError> {
        Err(SequenceError::AddressTooLong {
            extra: address.len(),
        })
    }

    fn resource_count(&self) -> usize {
        1
    }

    fn into_resource(self) -> Option<MediaResource> {
        Some(self)
    }

    fn from_resource(resource: MediaResource) -> Result<Self, MediaResource> {
        Ok(resource)
    }
}

impl<T: ResourceSequence> ResourceSequence for Vec<T> {
    const DEPTH: usize = T::DEPTH + 1;

    fn resolve(&self, address: &[usize], level: usize) -> Result<&MediaResource, SequenceError> {
        let Some((&index, rest)) = address.split_first() else {
            return Err(SequenceError::AddressTooShort {
                depth: level,
                expected: level + Self::DEPTH,
            });
        };
        let child = self.as_slice().get(index).ok_or(SequenceError::OutOfBounds {
            index,
            len: self.len(),
            depth: level,
        })?;
        child.resolve(rest, level + 1)
    }

    fn collect_matches(
        &self,
        predicate: &mut dyn FnMut(&MediaResource) -> bool,
        prefix: &mut PathAddress,
        match_first: bool,
        out: &mut Vec<PathAddress>,
    ) {
        for (index, child) in self.iter().enumerate() {
            prefix.push(index);
            child.collect_matches(predicate, prefix, match_first, out);
            prefix.pop();
            if match_first && !out.is_empty() {
                return;
            }
        }
    }

    fn remove_at(&mut self, address: &[usize]) -> Option<MediaResource> {
        let (&index, rest) = address.split_first()?;
        if index >= self.len() {
            return None;
        }
        if rest.is_empty() {
            // Only leaves are removed; a shorter address names a whole group.
            if T::DEPTH != 0 {
                return None;
            }
            return Vec::remove(self, index).into_resource();
        }
        self[index].remove_at(rest)
    }

    fn insert_at(
        &mut self,
        address: &[usize],
        level: usize,
        resource: MediaResource,
    ) -> Result<(), SequenceError> {
        let Some((&index, rest)) = address.split_first() else {
            return Err(SequenceError::AddressTooShort {
                depth: level,
                expected: level + Self::DEPTH,
            });
        };
        if rest.is_empty() {
            if index > self.len() {
                return Err(SequenceError::OutOfBounds {
                    index,
                    len: self.len(),
                    depth: level,
                });
            }
            return match T::from_resource(resource) {
                Ok(item) => {
                    Vec::insert(self, index, item);
                    Ok(())
                }
                Err(_) => Err(SequenceError::AddressTooShort {
                    depth: level + 1,
                    expected: level + Self::DEPTH,
                }),
            };
        }
        let len = self.len();
        let child = self.get_mut(index).ok_or(SequenceError::OutOfBounds {
            index,
            len,
            depth: level,
        })?;
        child.insert_at(rest, level + 1, resource)
    }

    fn resource_count(&self) -> usize {
        self.iter().map(ResourceSequence::resource_count).sum()
    }

    fn into_resource(self) -> Option<MediaResource> {
        None
    }

    fn from_resource(resource: MediaResource) -> Result<Self, MediaResource> {
        Err(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MediaKind;

    fn item(id: &str) -> MediaResource {
        MediaResource::new(id, MediaKind::Image)
    }

    fn flat(n: usize) -> Vec<MediaResource> {
        (0..n).map(|i| item(&format!("f{i}"))).collect()
    }

    fn grid(groups: usize, per_group: usize) -> Vec<Vec<MediaResource>> {
        (0..groups)
            .map(|g| (0..per_group).map(|i| item(&format!("g{g}-{i}"))).collect())
            .collect()
    }

    fn cube() -> Vec<Vec<Vec<MediaResource>>> {
        vec![
            vec![vec![item("a"), item("b")], vec![]],
            vec![vec![item("c")], vec![item("d"), item("e"), item("f")]],
        ]
    }

    fn every_resource<S: ResourceSequence>(seq: &S) -> Vec<MediaResource> {
        seq.all_addresses()
            .iter()
            .map(|a| seq.get(a).unwrap().clone())
            .collect()
    }

    fn assert_address_round_trip<S: ResourceSequence>(seq: &S) {
        for resource in every_resource(seq) {
            let found = seq.filter(|r| *r == resource, true);
            assert_eq!(found.len(), 1, "match_first returns one address");
            assert_eq!(seq.get(&found[0]).unwrap(), &resource);
        }
    }

    fn assert_strictly_increasing(addresses: &[PathAddress]) {
        for pair in addresses.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn depth_is_structural() {
        assert_eq!(item("x").depth(), 0);
        assert_eq!(flat(3).depth(), 1);
        assert_eq!(grid(2, 2).depth(), 2);
        assert_eq!(cube().depth(), 3);
    }

    #[test]
    fn every_resource_round_trips_through_its_address() {
        assert_address_round_trip(&flat(4));
        assert_address_round_trip(&grid(2, 5));
        assert_address_round_trip(&cube());
    }

    #[test]
    fn enumeration_follows_reading_order() {
        let f = flat(4).all_addresses();
        assert_eq!(f.len(), 4);
        assert_strictly_increasing(&f);

        let g = grid(3, 2).all_addresses();
        assert_eq!(g.first(), Some(&PathAddress::from([0, 0])));
        assert_eq!(g.last(), Some(&PathAddress::from([2, 1])));
        assert_strictly_increasing(&g);

        let c = cube().all_addresses();
        assert_eq!(
            c,
            vec![
                PathAddress::from([0, 0, 0]),
                PathAddress::from([0, 0, 1]),
                PathAddress::from([1, 0, 0]),
                PathAddress::from([1, 1, 0]),
                PathAddress::from([1, 1, 1]),
                PathAddress::from([1, 1, 2]),
            ]
        );
        assert_strictly_increasing(&c);
    }

    #[test]
    fn match_first_stops_visiting() {
        let seq = grid(2, 5);
        let mut visited = 0;
        let found = seq.filter(
            |r| {
                visited += 1;
                r.id().as_str().starts_with("g0")
            },
            true,
        );
        assert_eq!(found, vec![PathAddress::from([0, 0])]);
        assert_eq!(visited, 1);

        let all_g1 = seq.filter(|r| r.id().as_str().starts_with("g1"), false);
        assert_eq!(all_g1.len(), 5);
        assert!(seq.filter(|_| false, true).is_empty());
    }

    #[test]
    fn wraparound_returns_to_start_after_n_steps() {
        let seq = grid(2, 3);
        let n = seq.resource_count();
        for start in seq.all_addresses() {
            let mut at = start.clone();
            for _ in 0..n {
                at = seq.next_after(&at, true).unwrap();
            }
            assert_eq!(at, start);

            let mut back = start.clone();
            for _ in 0..n {
                back = seq.next_before(&back, true).unwrap();
            }
            assert_eq!(back, start);
        }
    }

    #[test]
    fn no_wrap_stops_at_both_ends() {
        let seq = grid(2, 3);
        assert_eq!(seq.next_after(&[1, 2], false), None);
        assert_eq!(seq.next_before(&[0, 0], false), None);
        assert_eq!(seq.next_after(&[0, 2], false), Some(PathAddress::from([1, 0])));
        assert_eq!(seq.next_before(&[1, 0], false), Some(PathAddress::from([0, 2])));
    }

    #[test]
    fn stale_address_has_no_neighbor() {
        let seq = flat(3);
        assert_eq!(seq.next_after(&[7], true), None);
        assert_eq!(seq.next_before(&[0, 1], true), None);
    }

    #[test]
    fn single_resource_has_no_neighbor_even_when_wrapping() {
        let seq = flat(1);
        assert_eq!(seq.next_after(&[0], true), None);
        assert_eq!(seq.next_before(&[0], true), None);
    }

    #[test]
    fn lookup_errors_name_the_offending_segment() {
        let seq = grid(2, 5);
        assert_eq!(
            seq.get(&[1, 9]),
            Err(SequenceError::OutOfBounds {
                index: 9,
                len: 5,
                depth: 1
            })
        );
        assert_eq!(
            seq.get(&[1]),
            Err(SequenceError::AddressTooShort {
                depth: 1,
                expected: 2
            })
        );
        assert_eq!(
            seq.get(&[1, 0, 0]),
            Err(SequenceError::AddressTooLong { extra: 1 })
        );
    }

    #[test]
    fn remove_detaches_from_parent_and_shifts_later_siblings() {
        let mut seq = grid(2, 5);
        let removed = seq.remove_at(&[0, 2]).unwrap();
        assert_eq!(removed.id().as_str(), "g0-2");
        assert_eq!(seq[0].len(), 4);
        assert_eq!(seq.get(&[0, 2]).unwrap().id().as_str(), "g0-3");
        assert_eq!(seq.get(&[1, 0]).unwrap().id().as_str(), "g1-0");
        assert_eq!(seq.resource_count(), 9);
    }

    #[test]
    fn remove_rejects_group_and_missing_addresses() {
        let mut seq = grid(2, 2);
        assert_eq!(seq.remove_at(&[0]), None);
        assert_eq!(seq.remove_at(&[5, 0]), None);
        assert_eq!(seq.remove_at(&[0, 5]), None);
        assert_eq!(seq.remove_at(&[]), None);
        assert_eq!(seq.resource_count(), 4);
    }

    #[test]
    fn emptied_group_is_skipped_by_enumeration() {
        let mut seq = grid(2, 1);
        seq.remove_at(&[0, 0]).unwrap();
        assert_eq!(seq.all_addresses(), vec![PathAddress::from([1, 0])]);
    }

    #[test]
    fn insert_places_resource_at_exact_address() {
        let mut seq = grid(2, 2);
        seq.insert_resource(&[1, 2], item("tail")).unwrap();
        seq.insert_resource(&[0, 0], item("head")).unwrap();
        assert_eq!(seq.get(&[0, 0]).unwrap().id().as_str(), "head");
        assert_eq!(seq.get(&[0, 1]).unwrap().id().as_str(), "g0-0");
        assert_eq!(seq.get(&[1, 2]).unwrap().id().as_str(), "tail");
        assert_eq!(
            seq.insert_resource(&[0, 9], item("x")),
            Err(SequenceError::OutOfBounds {
                index: 9,
                len: 3,
                depth: 1
            })
        );
        assert_eq!(
            seq.insert_resource(&[0], item("x")),
            Err(SequenceError::AddressTooShort {
                depth: 1,
                expected: 2
            })
        );
    }
}
