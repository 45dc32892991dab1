// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial dimension of a mesh

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::Node;

/// Mesh dimension: triangles with edge boundaries, or tetrahedra with face
/// boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "u32", try_from = "u32")
)]
pub enum Dimension {
    Two,
    Three,
}

impl Dimension {
    /// Detect the dimension from node coordinates: any nonzero z means 3D.
    pub fn detect(nodes: &[Node]) -> Self {
        if nodes.par_iter().any(|node| node.z != 0.0) {
            Dimension::Three
        } else {
            Dimension::Two
        }
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }
}

impl From<Dimension> for u32 {
    fn from(dimension: Dimension) -> Self {
        dimension.as_u32()
    }
}

impl TryFrom<u32> for Dimension {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            2 => Ok(Dimension::Two),
            3 => Ok(Dimension::Three),
            other => Err(Error::UnsupportedDimension(other)),
        }
    }
}

impl FromStr for Dimension {
    type Err = Error;

    /// Accepts `2`, `3`, `2d`, `3D`, ...
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix(['d', 'D'])
            .unwrap_or(trimmed);
        let value: u32 = digits
            .parse()
            .map_err(|_| Error::format(format!("invalid dimension '{}'", s)))?;
        Dimension::try_from(value)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D", self.as_u32())
    }
}
