// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.
#![deny(missing_docs)]

//! An equivalence relation on the integers 0..N, built up by joins.
//!
//! Each set is kept as a circular linked list threaded through `next_element`,
//! and every element stores the id of the set it belongs to.  A join relabels
//! the members of the smaller set, so n joins cost O( n * log(N) ).
//!
//! Set ids are internal.  Callers that need stable numbering should use
//! `dense_labels`, which numbers sets by their smallest element and is
//! therefore independent of the order in which joins were made.

/// The type used to represent an element.  32 bits cover the number of
/// distinct junctions or clonotypes in any dataset we handle, and keep the
/// footprint at 12 bytes per element.
type ElementId = u32;

/// The type used to enumerate the individual disjoint sets.
type SetId = u32;

/// Partition of N elements into disjoint sets.
#[derive(Clone, Debug)]
pub struct EquivRel {
    /// Next element in the circular list of the set containing element i.
    next_element: Vec<ElementId>,
    /// Set currently containing element i.
    set_id: Vec<SetId>,
    /// Number of elements in set s; zero once s has been emptied by a join.
    size: Vec<u32>,
}

impl EquivRel {
    /// Create n singleton sets.
    pub fn new(n: u32) -> EquivRel {
        EquivRel {
            next_element: (0..n).collect(),
            set_id: (0..n as SetId).collect(),
            size: vec![1; n as usize],
        }
    }

    /// Return the number of elements.
    pub fn len(&self) -> usize {
        self.set_id.len()
    }

    /// True if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.set_id.is_empty()
    }

    /// Merge the sets containing a and b.  Return true if they were distinct.
    pub fn join(&mut self, a: usize, b: usize) -> bool {
        // Relabel the smaller side.
        let (a, b) = if self.size_of_set_containing(a) < self.size_of_set_containing(b) {
            (b, a)
        } else {
            (a, b)
        };
        let kept = self.set_id(a);
        let emptied = self.set_id(b);
        if kept == emptied {
            return false;
        }
        let new_size = self.size[kept] + self.size[emptied];

        // Splice the two circular lists, then walk the former b list.
        self.next_element.swap(a, b);
        let mut next = self.next_element(a);
        while self.set_id(next) != kept {
            self.set_id[next] = kept as SetId;
            next = self.next_element(next);
        }
        self.size[kept] = new_size;
        self.size[emptied] = 0;
        true
    }

    /// Return the number of non-empty sets.
    pub fn n_sets(&self) -> usize {
        self.size.iter().filter(|s| **s > 0).count()
    }

    /// Return the size of the set containing a.
    fn size_of_set_containing(&self, a: usize) -> usize {
        self.size[self.set_id(a)] as usize
    }

    /// Return the internal id of the set containing a.
    fn set_id(&self, a: usize) -> usize {
        self.set_id[a] as usize
    }

    /// Label each element with a dense set number.  Sets are numbered 0, 1, 2, ...
    /// in the order of their smallest element, so the labels depend only on the
    /// partition and not on the join history.
    pub fn dense_labels(&self) -> Vec<u32> {
        let mut renumber = vec![u32::MAX; self.len()];
        let mut next = 0;
        self.set_id
            .iter()
            .map(|&s| {
                let slot = &mut renumber[s as usize];
                if *slot == u32::MAX {
                    *slot = next;
                    next += 1;
                }
                *slot
            })
            .collect()
    }

    fn next_element(&self, a: usize) -> usize {
        self.next_element[a] as usize
    }
}
