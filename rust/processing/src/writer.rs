// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MTC output
//!
//! ```text
//! <nodeCount> <dimension> <elementCount> <valuesPerLine>
//! <x> <y> [<z>]            one line per node, 16 decimals
//! <n1> .. <nK>             one line per main element
//! <n1> .. <nK-1> 0         one line per boundary element
//! ```
//!
//! Lines are formatted in parallel into chunk buffers; the file is only
//! opened once everything is formatted. The data goes to a temporary file in
//! the destination directory which replaces the target on success, so a
//! failed run never leaves a truncated mesh behind.

use std::fmt::{self, Write as _};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use gmsh_mtc_core::{Dimension, Error, Node, Result};
use rayon::prelude::*;
use serde::Serialize;

use crate::kind::MeshKind;

/// Lines formatted per parallel work item
const FORMAT_CHUNK: usize = 8 * 1024;

/// Buffered writer capacity
const WRITE_BUFFER: usize = 1024 * 1024;

/// First line of an MTC file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MtcHeader {
    pub node_count: usize,
    pub dimension: Dimension,
    /// Main plus boundary elements
    pub element_count: usize,
    pub values_per_line: u32,
}

impl fmt::Display for MtcHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.node_count,
            self.dimension.as_u32(),
            self.element_count,
            self.values_per_line
        )
    }
}

impl FromStr for MtcHeader {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split_ascii_whitespace().collect();
        let [nodes, dimension, elements, values] = fields[..] else {
            return Err(Error::format(format!(
                "MTC header needs 4 fields, found {}",
                fields.len()
            )));
        };

        let number = |token: &str| -> Result<usize> {
            token.parse().map_err(|_| Error::numeric(0, token))
        };
        let dimension = u32::try_from(number(dimension)?)
            .map_err(|_| Error::numeric(0, dimension))
            .and_then(Dimension::try_from)?;

        Ok(Self {
            node_count: number(nodes)?,
            dimension,
            element_count: number(elements)?,
            values_per_line: u32::try_from(number(values)?)
                .map_err(|_| Error::numeric(0, values))?,
        })
    }
}

/// Read only the header line of an existing MTC file.
pub fn read_mtc_header(path: &Path) -> Result<MtcHeader> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(Error::format(format!("{} is empty", path.display())));
    }
    line.trim().parse()
}

/// Append `indices` followed by optional `trailer`, space separated.
#[inline]
fn write_indices(out: &mut String, indices: &[u32], trailer: Option<u32>) {
    for index in indices.iter().chain(trailer.as_ref()) {
        let _ = write!(out, "{} ", index);
    }
    out.push('\n');
}

/// Format `items` into chunk strings, in order, in parallel.
fn format_chunks<T, W>(items: &[T], bytes_per_line: usize, write_line: W) -> Vec<String>
where
    T: Sync,
    W: Fn(&mut String, &T) + Sync,
{
    items
        .par_chunks(FORMAT_CHUNK)
        .map(|chunk| {
            let mut out = String::with_capacity(chunk.len() * bytes_per_line);
            for item in chunk {
                write_line(&mut out, item);
            }
            out
        })
        .collect()
}

/// Fully formatted MTC content, ready to be written
#[derive(Debug)]
pub struct MtcDocument {
    pub header: MtcHeader,
    nodes: Vec<String>,
    elements: Vec<String>,
    boundary: Vec<String>,
}

impl MtcDocument {
    /// Format a converted mesh.
    pub fn format<K: MeshKind>(
        nodes: &[Node],
        elements: &[K::Element],
        boundary: &[K::Facet],
    ) -> Self {
        let header = MtcHeader {
            node_count: nodes.len(),
            dimension: K::DIMENSION,
            element_count: elements.len() + boundary.len(),
            values_per_line: K::values_per_line(),
        };

        let node_bytes = (K::DIMENSION.as_u32() as usize) * 20;
        let nodes = format_chunks(nodes, node_bytes, K::write_node);
        let elements = format_chunks(elements, 32, |out, element: &K::Element| {
            write_indices(out, element.as_ref(), None)
        });
        let boundary = format_chunks(boundary, 32, |out, facet: &K::Facet| {
            write_indices(out, facet.as_ref(), Some(0))
        });

        Self {
            header,
            nodes,
            elements,
            boundary,
        }
    }

    /// Header, nodes, main elements, boundary elements, in that order.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{}", self.header)?;
        for chunk in self.nodes.iter().chain(&self.elements).chain(&self.boundary) {
            writer.write_all(chunk.as_bytes())?;
        }
        writer.flush()
    }

    /// Write to `path`, replacing it atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::with_capacity(WRITE_BUFFER, staged.as_file_mut());
            self.write_to(&mut writer)?;
        }
        staged.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Whole document as a string (small meshes, tests)
    pub fn to_text(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
