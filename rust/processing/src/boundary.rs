// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary extraction by facet multiplicity
//!
//! Every main element contributes its facets (edges of a triangle, faces of
//! a tetrahedron). A facet shared by two elements is interior; a facet seen
//! exactly once lies on the boundary. Facets are identified by their sorted
//! node indices, while the emitted boundary element keeps the winding it had
//! in its owning element.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::kind::{IndexTuple, MeshKind};

/// Order-independent identity of a facet: its sorted node indices.
#[inline]
pub fn canonical_key<F: IndexTuple>(facet: &F) -> F {
    let mut key = *facet;
    key.as_mut().sort_unstable();
    key
}

/// Multiplicity statistics of one boundary pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FacetCounts {
    /// Facets synthesized from main elements
    pub candidates: usize,
    /// Distinct facets seen once
    pub boundary: usize,
    /// Distinct facets seen twice
    pub interior: usize,
    /// Distinct facets seen three times or more (malformed mesh)
    pub non_manifold: usize,
}

/// Boundary elements plus their multiplicity statistics
#[derive(Debug, Clone)]
pub struct Boundary<F> {
    pub facets: Vec<F>,
    pub counts: FacetCounts,
}

/// Representative facet with its running count
type Tally<F> = FxHashMap<F, (F, u32)>;

/// Synthesize all facets of `elements`, element-major, original winding.
pub fn extract_facets<K: MeshKind>(elements: &[K::Element]) -> Vec<K::Facet> {
    let mut facets = vec![K::Facet::default(); elements.len() * K::FACETS_PER_ELEMENT];
    facets
        .par_chunks_mut(K::FACETS_PER_ELEMENT)
        .zip(elements.par_iter())
        .for_each(|(out, element)| K::facets(element, out));
    facets
}

/// Count facet multiplicities.
///
/// Each worker tallies into its own map; maps are merged pairwise by adding
/// counts, so the result does not depend on scheduling.
fn count_facets<F>(facets: &[F]) -> Tally<F>
where
    F: IndexTuple + Eq + std::hash::Hash,
{
    facets
        .par_iter()
        .fold(Tally::default, |mut tally, facet| {
            tally
                .entry(canonical_key(facet))
                .and_modify(|(_, count)| *count += 1)
                .or_insert((*facet, 1));
            tally
        })
        .reduce(Tally::default, |a, b| {
            let (mut large, small) = if a.len() >= b.len() { (a, b) } else { (b, a) };
            for (key, (facet, count)) in small {
                large
                    .entry(key)
                    .and_modify(|(_, total)| *total += count)
                    .or_insert((facet, count));
            }
            large
        })
}

/// Detect the boundary facets of a mesh.
///
/// Output is sorted by canonical key, so it is identical across runs and
/// thread counts.
pub fn detect_boundary<K: MeshKind>(elements: &[K::Element]) -> Boundary<K::Facet> {
    let facets = extract_facets::<K>(elements);
    let tally = count_facets(&facets);

    let mut counts = FacetCounts {
        candidates: facets.len(),
        ..FacetCounts::default()
    };
    drop(facets);

    let mut keyed: Vec<(K::Facet, K::Facet)> = Vec::with_capacity(tally.len() / 2 + 1);
    for (key, (facet, count)) in tally {
        match count {
            1 => keyed.push((key, facet)),
            2 => counts.interior += 1,
            _ => counts.non_manifold += 1,
        }
    }
    counts.boundary = keyed.len();

    if counts.non_manifold > 0 {
        tracing::warn!(
            non_manifold = counts.non_manifold,
            "{} shared by more than two {}",
            K::FACET_NAME,
            K::ELEMENT_NAME
        );
    }

    keyed.par_sort_unstable_by(|a, b| a.0.cmp(&b.0));
    let facets = keyed.into_par_iter().map(|(_, facet)| facet).collect();

    Boundary { facets, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{Planar, Volumetric};

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key(&[9u32, 2]), [2, 9]);
        assert_eq!(canonical_key(&[5u32, 1, 3]), [1, 3, 5]);
    }

    #[test]
    fn test_square_boundary() {
        // Clockwise unit square split along the 1-3 diagonal
        let triangles = vec![[1, 3, 2], [1, 4, 3]];
        let boundary = detect_boundary::<Planar>(&triangles);

        assert_eq!(
            boundary.counts,
            FacetCounts {
                candidates: 6,
                boundary: 4,
                interior: 1,
                non_manifold: 0,
            }
        );
        assert_eq!(boundary.facets, vec![[2, 1], [1, 4], [3, 2], [4, 3]]);
    }

    #[test]
    fn test_two_tetrahedra_share_one_face() {
        let tets = vec![[1, 2, 3, 4], [1, 2, 3, 5]];
        let boundary = detect_boundary::<Volumetric>(&tets);

        assert_eq!(boundary.counts.candidates, 8);
        assert_eq!(boundary.counts.interior, 1);
        assert_eq!(boundary.counts.boundary, 6);
        assert!(boundary
            .facets
            .iter()
            .all(|face| canonical_key(face) != [1, 2, 3]));
    }

    #[test]
    fn test_boundary_keeps_owner_winding() {
        let tets = vec![[1, 2, 3, 4]];
        let boundary = detect_boundary::<Volumetric>(&tets);
        // Sorted by key: {1,2,3} {1,2,4} {1,3,4} {2,3,4}
        assert_eq!(
            boundary.facets,
            vec![[1, 3, 2], [1, 2, 4], [1, 4, 3], [2, 3, 4]]
        );
    }

    #[test]
    fn test_non_manifold_edges_are_dropped() {
        // Three triangles fanning around edge 1-2
        let triangles = vec![[1, 2, 3], [2, 1, 4], [1, 2, 5]];
        let boundary = detect_boundary::<Planar>(&triangles);
        assert_eq!(boundary.counts.non_manifold, 1);
        assert_eq!(boundary.counts.boundary, 6);
    }

    #[test]
    fn test_counts_independent_of_thread_count() {
        let triangles: Vec<[u32; 3]> = (0..2000u32)
            .map(|i| [i + 1, i + 2, i + 3])
            .collect();

        let run = |threads: usize| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
                .install(|| detect_boundary::<Planar>(&triangles))
        };

        let single = run(1);
        let many = run(4);
        assert_eq!(single.counts, many.counts);
        assert_eq!(single.facets, many.facets);
    }
}
