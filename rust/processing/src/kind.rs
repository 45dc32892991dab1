// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dimension strategies
//!
//! The pipeline is written once, generic over [`MeshKind`]. The two kinds
//! fix the element shapes, the GMSH type code, the facet table and the node
//! line format at compile time, so the per-element loops are monomorphized
//! and carry no dynamic dispatch.

use std::fmt::Write;
use std::hash::Hash;

use gmsh_mtc_core::{parse_elements, Dimension, Node, Sections, TETRAHEDRON, TRIANGLE};

use crate::orientation::orient_clockwise;

/// Fixed-width tuple of 1-based node indices
pub trait IndexTuple: Copy + Default + Send + Sync + AsRef<[u32]> + AsMut<[u32]> {}

impl<T> IndexTuple for T where T: Copy + Default + Send + Sync + AsRef<[u32]> + AsMut<[u32]> {}

/// Capabilities that differ between 2D and 3D conversion.
pub trait MeshKind: Send + Sync + 'static {
    const DIMENSION: Dimension;
    /// GMSH type code of the main element
    const ELEMENT_TYPE: u32;
    const FACETS_PER_ELEMENT: usize;
    /// Plural names used in logs
    const ELEMENT_NAME: &'static str;
    const FACET_NAME: &'static str;

    /// Main element: triangle or tetrahedron
    type Element: IndexTuple;
    /// Boundary element: edge or triangular face
    type Facet: IndexTuple + Eq + Ord + Hash;

    fn parse_elements(
        lines: &[&str],
        sections: &Sections,
        node_count: usize,
    ) -> gmsh_mtc_core::Result<Vec<Self::Element>>;

    /// Write the facets of `element` into `out`, preserving winding.
    ///
    /// `out` has exactly [`Self::FACETS_PER_ELEMENT`] slots.
    fn facets(element: &Self::Element, out: &mut [Self::Facet]);

    /// Global orientation pass after parsing; returns true if elements were
    /// rewound.
    fn orient(_elements: &mut [Self::Element], _nodes: &[Node]) -> bool {
        false
    }

    /// Append one node line, `\n`-terminated.
    fn write_node(out: &mut String, node: &Node);

    /// Values per line in the MTC header
    fn values_per_line() -> u32 {
        Self::DIMENSION.as_u32() + 1
    }
}

/// 2D: triangles, boundary edges
#[derive(Debug, Clone, Copy, Default)]
pub struct Planar;

impl MeshKind for Planar {
    const DIMENSION: Dimension = Dimension::Two;
    const ELEMENT_TYPE: u32 = TRIANGLE;
    const FACETS_PER_ELEMENT: usize = 3;
    const ELEMENT_NAME: &'static str = "triangles";
    const FACET_NAME: &'static str = "edges";

    type Element = [u32; 3];
    type Facet = [u32; 2];

    fn parse_elements(
        lines: &[&str],
        sections: &Sections,
        node_count: usize,
    ) -> gmsh_mtc_core::Result<Vec<Self::Element>> {
        parse_elements::<3>(lines, sections, TRIANGLE, node_count)
    }

    #[inline]
    fn facets(t: &Self::Element, out: &mut [Self::Facet]) {
        out[0] = [t[0], t[1]];
        out[1] = [t[1], t[2]];
        out[2] = [t[2], t[0]];
    }

    fn orient(elements: &mut [Self::Element], nodes: &[Node]) -> bool {
        orient_clockwise(elements, nodes)
    }

    #[inline]
    fn write_node(out: &mut String, node: &Node) {
        // Writing to a String cannot fail
        let _ = writeln!(out, "{:.16} {:.16} ", node.x, node.y);
    }
}

/// 3D: tetrahedra, boundary triangles
#[derive(Debug, Clone, Copy, Default)]
pub struct Volumetric;

impl MeshKind for Volumetric {
    const DIMENSION: Dimension = Dimension::Three;
    const ELEMENT_TYPE: u32 = TETRAHEDRON;
    const FACETS_PER_ELEMENT: usize = 4;
    const ELEMENT_NAME: &'static str = "tetrahedra";
    const FACET_NAME: &'static str = "faces";

    type Element = [u32; 4];
    type Facet = [u32; 3];

    fn parse_elements(
        lines: &[&str],
        sections: &Sections,
        node_count: usize,
    ) -> gmsh_mtc_core::Result<Vec<Self::Element>> {
        parse_elements::<4>(lines, sections, TETRAHEDRON, node_count)
    }

    /// Face table giving outward normals for a positively wound tetrahedron.
    #[inline]
    fn facets(t: &Self::Element, out: &mut [Self::Facet]) {
        out[0] = [t[0], t[2], t[1]];
        out[1] = [t[0], t[1], t[3]];
        out[2] = [t[0], t[3], t[2]];
        out[3] = [t[1], t[2], t[3]];
    }

    #[inline]
    fn write_node(out: &mut String, node: &Node) {
        let _ = writeln!(out, "{:.16} {:.16} {:.16} ", node.x, node.y, node.z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_facets_keep_winding() {
        let mut edges = [[0u32; 2]; 3];
        Planar::facets(&[4, 7, 9], &mut edges);
        assert_eq!(edges, [[4, 7], [7, 9], [9, 4]]);
    }

    #[test]
    fn test_volumetric_face_table() {
        let mut faces = [[0u32; 3]; 4];
        Volumetric::facets(&[1, 2, 3, 4], &mut faces);
        assert_eq!(faces, [[1, 3, 2], [1, 2, 4], [1, 4, 3], [2, 3, 4]]);
    }

    #[test]
    fn test_outward_normals_for_reference_tetrahedron() {
        let nodes = [
            Node::new(0.0, 0.0, 0.0),
            Node::new(1.0, 0.0, 0.0),
            Node::new(0.0, 1.0, 0.0),
            Node::new(0.0, 0.0, 1.0),
        ];
        let centroid = Node::from((nodes[0].coords + nodes[1].coords + nodes[2].coords + nodes[3].coords) / 4.0);

        let mut faces = [[0u32; 3]; 4];
        Volumetric::facets(&[1, 2, 3, 4], &mut faces);
        for face in faces {
            let [a, b, c] = face.map(|i| nodes[i as usize - 1]);
            let normal = (b - a).cross(&(c - a));
            assert!(normal.dot(&(a - centroid)) > 0.0, "face {:?} points inward", face);
        }
    }

    #[test]
    fn test_node_lines() {
        let node = Node::new(0.5, -1.0, 2.0);
        let mut line = String::new();
        Planar::write_node(&mut line, &node);
        assert_eq!(line, "0.5000000000000000 -1.0000000000000000 \n");

        line.clear();
        Volumetric::write_node(&mut line, &node);
        assert_eq!(
            line,
            "0.5000000000000000 -1.0000000000000000 2.0000000000000000 \n"
        );
        assert_eq!(Volumetric::values_per_line(), 4);
    }
}
