// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for mesh reading operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a GMSH file
#[derive(Error, Debug)]
pub enum Error {
    /// Missing section markers, malformed headers, inconsistent counts
    #[error("File format error: {0}")]
    FileFormat(String),

    /// A coordinate or index token is not a valid number (line is 1-based)
    #[error("Invalid number '{token}' at line {line}")]
    NumericParse { line: usize, token: String },

    #[error("Unsupported dimension: {0}. Only 2D and 3D are supported")]
    UnsupportedDimension(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::FileFormat`] error
    pub fn format(message: impl Into<String>) -> Self {
        Error::FileFormat(message.into())
    }

    /// Shorthand for a [`Error::NumericParse`] error from a 0-based line index
    pub fn numeric(line_index: usize, token: &str) -> Self {
        Error::NumericParse {
            line: line_index + 1,
            token: token.to_string(),
        }
    }
}
