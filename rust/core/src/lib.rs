// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # GMSH-MTC Core Reader
//!
//! Parallel reader for GMSH v4 ASCII meshes, the input side of the
//! GMSH to MTC converter.
//!
//! ## Overview
//!
//! - **Section location**: one pass over the trimmed lines finds the
//!   `$Nodes` and `$Elements` sections
//! - **Node parsing**: entity blocks are located sequentially, then their
//!   coordinate lines are parsed in parallel into a dense array
//! - **Element parsing**: blocks of one element type (triangles or
//!   tetrahedra) are parsed in parallel; indices stay 1-based
//! - **Dimension detection**: any nonzero z coordinate means a 3D mesh
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gmsh_mtc_core::{parse_elements, parse_nodes, split_lines, Sections, TRIANGLE};
//!
//! let content = std::fs::read_to_string("square.msh")?;
//! let lines = split_lines(&content);
//! let sections = Sections::locate(&lines)?;
//! let nodes = parse_nodes(&lines, &sections)?;
//! let triangles = parse_elements::<3>(&lines, &sections, TRIANGLE, nodes.len())?;
//! ```
//!
//! All parallel work runs on the ambient rayon pool; callers that need a
//! bounded pool wrap the calls in `ThreadPool::install`.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for [`Dimension`]

pub mod dimension;
pub mod elements;
pub mod error;
pub mod fast_parse;
pub mod nodes;
pub mod sections;

/// A mesh node. 2D meshes carry z = 0.
pub type Node = nalgebra::Point3<f64>;

pub use dimension::Dimension;
pub use elements::{parse_elements, scan_element_blocks, ElementBlock, TETRAHEDRON, TRIANGLE};
pub use error::{Error, Result};
pub use nodes::{parse_nodes, scan_node_blocks, NodeBlock};
pub use sections::{split_lines, Sections};
