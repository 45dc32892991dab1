// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D triangle orientation
//!
//! The solver expects clockwise triangles. Meshers emit one consistent
//! winding for a whole surface, so the decision is taken once from the first
//! triangle and applied to all of them.

use gmsh_mtc_core::Node;
use rayon::prelude::*;

/// Twice the signed area of triangle `abc` in the xy-plane.
///
/// Positive for counter-clockwise winding, negative for clockwise.
#[inline]
pub fn signed_area(a: &Node, b: &Node, c: &Node) -> f64 {
    let e1 = (b - a).xy();
    let e2 = (c - a).xy();
    e1.perp(&e2)
}

/// Signed area of a triangle given by 1-based node indices
#[inline]
pub fn triangle_signed_area(triangle: &[u32; 3], nodes: &[Node]) -> f64 {
    let [a, b, c] = triangle.map(|index| &nodes[index as usize - 1]);
    signed_area(a, b, c)
}

/// Make every triangle clockwise if the first one is counter-clockwise.
///
/// Swaps vertices 1 and 2 of all triangles in parallel. Returns true if the
/// flip was applied.
pub fn orient_clockwise(triangles: &mut [[u32; 3]], nodes: &[Node]) -> bool {
    let Some(first) = triangles.first() else {
        return false;
    };

    if triangle_signed_area(first, nodes) <= 0.0 {
        return false;
    }

    tracing::info!(
        triangles = triangles.len(),
        "Flipping triangle winding (CCW -> CW)"
    );
    triangles.par_iter_mut().for_each(|t| t.swap(1, 2));
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Node> {
        vec![
            Node::new(0.0, 0.0, 0.0),
            Node::new(1.0, 0.0, 0.0),
            Node::new(1.0, 1.0, 0.0),
            Node::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_signed_area_sign() {
        let nodes = unit_square();
        assert!(triangle_signed_area(&[1, 2, 3], &nodes) > 0.0);
        assert!(triangle_signed_area(&[1, 3, 2], &nodes) < 0.0);
        assert_eq!(triangle_signed_area(&[1, 1, 3], &nodes), 0.0);
    }

    #[test]
    fn test_ccw_mesh_is_flipped() {
        let nodes = unit_square();
        let mut triangles = vec![[1, 2, 3], [1, 3, 4]];

        assert!(orient_clockwise(&mut triangles, &nodes));
        assert_eq!(triangles, vec![[1, 3, 2], [1, 4, 3]]);
        assert!(triangle_signed_area(&triangles[0], &nodes) <= 0.0);
    }

    #[test]
    fn test_cw_mesh_is_untouched() {
        let nodes = unit_square();
        let mut triangles = vec![[1, 3, 2], [1, 4, 3]];
        assert!(!orient_clockwise(&mut triangles, &nodes));
        assert_eq!(triangles, vec![[1, 3, 2], [1, 4, 3]]);
    }

    #[test]
    fn test_decision_uses_first_triangle_only() {
        let nodes = unit_square();
        // First CW, second CCW: nothing changes
        let mut triangles = vec![[1, 3, 2], [1, 3, 4]];
        assert!(!orient_clockwise(&mut triangles, &nodes));
        assert_eq!(triangles[1], [1, 3, 4]);
    }

    #[test]
    fn test_empty_mesh() {
        let mut triangles: Vec<[u32; 3]> = Vec::new();
        assert!(!orient_clockwise(&mut triangles, &unit_square()));
    }
}
