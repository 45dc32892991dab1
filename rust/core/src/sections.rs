// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section location
//!
//! A single pass over the trimmed input lines records where the `$Nodes`
//! and `$Elements` sections begin and end. Every later stage reads strictly
//! inside these ranges, so a missing or misordered marker is fatal.

use crate::error::{Error, Result};
use crate::fast_parse::{count_lines, parse_f64};

pub const MESH_FORMAT: &str = "$MeshFormat";
pub const NODES_START: &str = "$Nodes";
pub const NODES_END: &str = "$EndNodes";
pub const ELEMENTS_START: &str = "$Elements";
pub const ELEMENTS_END: &str = "$EndElements";

/// Split file content into trimmed lines, borrowing from the content.
pub fn split_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::with_capacity(count_lines(content.as_bytes()));
    lines.extend(content.lines().map(str::trim));
    lines
}

/// Line indices of the section markers (0-based, marker lines themselves)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections {
    pub nodes_start: usize,
    pub nodes_end: usize,
    pub elements_start: usize,
    pub elements_end: usize,
    /// `$MeshFormat` marker, when the file carries one
    pub mesh_format: Option<usize>,
}

impl Sections {
    /// Scan all lines once and record the section markers.
    pub fn locate(lines: &[&str]) -> Result<Self> {
        let mut mesh_format = None;
        let mut nodes_start = None;
        let mut nodes_end = None;
        let mut elements_start = None;
        let mut elements_end = None;

        for (i, line) in lines.iter().enumerate() {
            let slot = match *line {
                MESH_FORMAT => &mut mesh_format,
                NODES_START => &mut nodes_start,
                NODES_END => &mut nodes_end,
                ELEMENTS_START => &mut elements_start,
                ELEMENTS_END => &mut elements_end,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(i);
            }
        }

        let require = |marker: Option<usize>, name: &str| {
            marker.ok_or_else(|| Error::format(format!("missing {} marker", name)))
        };

        let sections = Self {
            nodes_start: require(nodes_start, NODES_START)?,
            nodes_end: require(nodes_end, NODES_END)?,
            elements_start: require(elements_start, ELEMENTS_START)?,
            elements_end: require(elements_end, ELEMENTS_END)?,
            mesh_format,
        };

        if sections.nodes_end <= sections.nodes_start + 1 {
            return Err(Error::format(format!(
                "{} at line {} does not close a node section",
                NODES_END,
                sections.nodes_end + 1
            )));
        }
        if sections.elements_end <= sections.elements_start + 1 {
            return Err(Error::format(format!(
                "{} at line {} does not close an element section",
                ELEMENTS_END,
                sections.elements_end + 1
            )));
        }

        Ok(sections)
    }

    /// Verify the `$MeshFormat` line declares ASCII version 4.x.
    ///
    /// Files without a `$MeshFormat` section pass unchecked.
    pub fn check_mesh_format(&self, lines: &[&str]) -> Result<()> {
        let Some(marker) = self.mesh_format else {
            return Ok(());
        };

        let line = lines
            .get(marker + 1)
            .ok_or_else(|| Error::format("truncated $MeshFormat section"))?;
        let mut tokens = line.split_ascii_whitespace();

        let version_token = tokens
            .next()
            .ok_or_else(|| Error::format("empty $MeshFormat header"))?;
        let version = parse_f64(version_token).ok_or_else(|| Error::numeric(marker + 1, version_token))?;
        if !(4.0..5.0).contains(&version) {
            return Err(Error::format(format!(
                "unsupported GMSH format version {} (expected 4.x)",
                version_token
            )));
        }

        match tokens.next() {
            Some("0") => Ok(()),
            Some(_) => Err(Error::format("binary GMSH files are not supported")),
            None => Err(Error::format("$MeshFormat header is missing the file type")),
        }
    }

    /// Line index of the count header following `$Nodes`
    #[inline]
    pub fn node_header(&self) -> usize {
        self.nodes_start + 1
    }

    /// Line index of the count header following `$Elements`
    #[inline]
    pub fn element_header(&self) -> usize {
        self.elements_start + 1
    }
}
