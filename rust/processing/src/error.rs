// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion errors with stage context.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Reading,
    SectionLocation,
    NodeParsing,
    ElementParsing,
    Orientation,
    BoundaryDetection,
    NodeCompaction,
    Formatting,
    OutputWriting,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Reading => "file reading",
            Stage::SectionLocation => "section location",
            Stage::NodeParsing => "node parsing",
            Stage::ElementParsing => "element parsing",
            Stage::Orientation => "orientation fix",
            Stage::BoundaryDetection => "boundary detection",
            Stage::NodeCompaction => "node compaction",
            Stage::Formatting => "output formatting",
            Stage::OutputWriting => "output writing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during a conversion
#[derive(Error, Debug)]
pub enum Error {
    /// A pipeline stage failed; the conversion was aborted
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: gmsh_mtc_core::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Stage the conversion failed in, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Attach stage context to core results.
pub(crate) trait StageContext<T> {
    fn in_stage(self, stage: Stage) -> Result<T>;
}

impl<T, E: Into<gmsh_mtc_core::Error>> StageContext<T> for std::result::Result<T, E> {
    fn in_stage(self, stage: Stage) -> Result<T> {
        self.map_err(|source| Error::Stage {
            stage,
            source: source.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_message() {
        let failed: std::result::Result<(), gmsh_mtc_core::Error> =
            Err(gmsh_mtc_core::Error::format("missing $Nodes marker"));
        let err = failed.in_stage(Stage::SectionLocation).unwrap_err();

        assert_eq!(err.stage(), Some(Stage::SectionLocation));
        assert_eq!(
            err.to_string(),
            "section location failed: File format error: missing $Nodes marker"
        );
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let failed: std::result::Result<(), std::io::Error> = Err(io);
        let err = failed.in_stage(Stage::Reading).unwrap_err();
        assert!(matches!(
            err,
            Error::Stage {
                stage: Stage::Reading,
                source: gmsh_mtc_core::Error::Io(_)
            }
        ));
    }
}
