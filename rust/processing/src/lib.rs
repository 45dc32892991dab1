// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GMSH-MTC Processing
//!
//! Turns a GMSH v4 mesh into an MTC solver mesh: orientation fix for 2D
//! triangles, boundary extraction by facet multiplicity, removal of
//! unreferenced nodes and parallel output formatting. Each conversion runs
//! on its own rayon pool sized by [`ConvertConfig::threads`].

pub mod boundary;
pub mod compact;
pub mod config;
pub mod error;
pub mod kind;
pub mod orientation;
pub mod pipeline;
pub mod writer;

pub use boundary::{canonical_key, detect_boundary, Boundary, FacetCounts};
pub use compact::{compact_nodes, IndexRemap};
pub use config::ConvertConfig;
pub use error::{Error, Result, Stage};
pub use kind::{MeshKind, Planar, Volumetric};
pub use pipeline::{
    output_path_for, Conversion, ConversionReport, ConversionStats, MeshConverter, StageTiming,
};
pub use writer::{read_mtc_header, MtcDocument, MtcHeader};
