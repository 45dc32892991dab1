// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion configuration loaded from environment variables.

use std::path::PathBuf;

use gmsh_mtc_core::Dimension;

use crate::error::{Error, Result};

/// Conversion configuration.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Number of worker threads for the conversion pool.
    pub threads: usize,
    /// Mesh dimension; `None` detects it from the node coordinates.
    pub dimension: Option<Dimension>,
    /// Directory receiving converted files; `None` writes next to the input.
    pub output_dir: Option<PathBuf>,
}

impl ConvertConfig {
    /// Load configuration from environment variables.
    ///
    /// - `GMSH_MTC_THREADS`: worker count (default: CPU count)
    /// - `GMSH_MTC_DIMENSION`: `2` or `3` (default: auto-detect)
    /// - `GMSH_MTC_OUTPUT_DIR`: output directory (default: next to input)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self {
            threads: std::env::var("GMSH_MTC_THREADS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or_else(num_cpus::get),
            dimension: std::env::var("GMSH_MTC_DIMENSION")
                .ok()
                .and_then(|v| v.parse().ok()),
            output_dir: std::env::var_os("GMSH_MTC_OUTPUT_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Reject configurations no conversion can run with.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(Error::Config("thread count must be at least 1".into()));
        }
        if let Some(dir) = &self.output_dir {
            if !dir.is_dir() {
                return Err(Error::Config(format!(
                    "output directory {} does not exist",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            dimension: None,
            output_dir: None,
        }
    }
}
