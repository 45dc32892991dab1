// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node compaction
//!
//! Drops nodes that no main or boundary element references and renumbers
//! the survivors to `1..=used`, keeping their original relative order.

use std::sync::atomic::{AtomicBool, Ordering};

use gmsh_mtc_core::Node;
use rayon::prelude::*;

use crate::kind::IndexTuple;

/// Old to new node index map (both 1-based, 0 = dropped)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRemap {
    map: Vec<u32>,
    used: usize,
}

impl IndexRemap {
    /// Assign new indices to used nodes in ascending original order.
    ///
    /// `used[0]` is ignored; `used[i]` refers to original node `i`.
    pub fn from_used(used: &[bool]) -> Self {
        let mut map = vec![0u32; used.len()];
        let mut next = 0u32;
        for (old, _) in used.iter().enumerate().skip(1).filter(|(_, u)| **u) {
            next += 1;
            map[old] = next;
        }
        Self {
            map,
            used: next as usize,
        }
    }

    /// New index of an original node, `None` if it was dropped
    #[inline]
    pub fn get(&self, old: u32) -> Option<u32> {
        match self.map.get(old as usize) {
            Some(&0) | None => None,
            Some(&new) => Some(new),
        }
    }

    /// Number of surviving nodes
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Number of original nodes
    #[inline]
    pub fn original(&self) -> usize {
        self.map.len().saturating_sub(1)
    }

    #[inline]
    pub fn removed(&self) -> usize {
        self.original() - self.used
    }

    /// Rewrite the indices of `elements` in place
    pub fn apply<E: IndexTuple>(&self, elements: &mut [E]) {
        elements.par_iter_mut().for_each(|element| {
            for index in element.as_mut() {
                *index = self.map[*index as usize];
            }
        });
    }
}

/// Flag every node referenced by any of `elements`.
fn mark_used<E: IndexTuple>(used: &[AtomicBool], elements: &[E]) {
    elements.par_iter().for_each(|element| {
        for &index in element.as_ref() {
            used[index as usize].store(true, Ordering::Relaxed);
        }
    });
}

/// Remove unreferenced nodes and renumber all elements.
///
/// Returns the remap; `remap.removed()` is the number of dropped nodes.
pub fn compact_nodes<E, F>(nodes: &mut Vec<Node>, elements: &mut [E], boundary: &mut [F]) -> IndexRemap
where
    E: IndexTuple,
    F: IndexTuple,
{
    let used: Vec<AtomicBool> = (0..=nodes.len()).map(|_| AtomicBool::new(false)).collect();
    mark_used(&used, elements);
    mark_used(&used, boundary);
    let used: Vec<bool> = used.into_iter().map(AtomicBool::into_inner).collect();

    let remap = IndexRemap::from_used(&used);

    // Filtered collect keeps ascending order, which is exactly the new numbering
    let compacted: Vec<Node> = nodes
        .par_iter()
        .enumerate()
        .filter(|(i, _)| used[i + 1])
        .map(|(_, node)| *node)
        .collect();
    debug_assert_eq!(compacted.len(), remap.used());
    *nodes = compacted;

    remap.apply(elements);
    remap.apply(boundary);

    remap
}
