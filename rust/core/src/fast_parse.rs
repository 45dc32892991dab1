// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fast Direct Parsing Module
//!
//! Token-level parsing for the hot per-line loops of the node and element
//! sections. Lines are split on ASCII whitespace only, floats go through
//! fast-float and integers through lexical-core, so a line never allocates
//! unless it turns out to be malformed.

use crate::error::{Error, Result};
use crate::Node;

/// Parse a float token
#[inline]
pub fn parse_f64(token: &str) -> Option<f64> {
    fast_float::parse::<f64, _>(token).ok()
}

/// Parse an unsigned integer token
#[inline]
pub fn parse_u32(token: &str) -> Option<u32> {
    lexical_core::parse::<u32>(token.as_bytes()).ok()
}

/// Parse a count token (block sizes, header totals)
#[inline]
pub fn parse_usize(token: &str) -> Option<usize> {
    lexical_core::parse::<usize>(token.as_bytes()).ok()
}

/// Count lines in raw file content using SIMD-accelerated newline search.
///
/// Used to pre-size the line array; a trailing line without `\n` counts too.
#[inline]
pub fn count_lines(bytes: &[u8]) -> usize {
    let newlines = memchr::memchr_iter(b'\n', bytes).count();
    match bytes.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}

/// Parse a coordinate line `x y [z ...]` into a node.
///
/// A missing z promotes to 0. Trailing values (parametric coordinates) are
/// ignored.
#[inline]
pub fn parse_coordinates(line: &str, line_index: usize) -> Result<Node> {
    let mut tokens = line.split_ascii_whitespace();
    let coordinate = |token: &str| {
        parse_f64(token).ok_or_else(|| Error::numeric(line_index, token))
    };

    let (Some(x), Some(y)) = (tokens.next(), tokens.next()) else {
        return Err(Error::format(format!(
            "line {}: expected at least 2 coordinates",
            line_index + 1
        )));
    };
    let x = coordinate(x)?;
    let y = coordinate(y)?;
    let z = match tokens.next() {
        Some(z) => coordinate(z)?,
        None => 0.0,
    };
    Ok(Node::new(x, y, z))
}

/// Parse an element line `tag n1 .. nN`, skipping the element tag.
///
/// Indices are returned exactly as written (1-based).
#[inline]
pub fn parse_element_nodes<const N: usize>(line: &str, line_index: usize) -> Result<[u32; N]> {
    let mut tokens = line.split_ascii_whitespace();
    if tokens.next().is_none() {
        return Err(Error::format(format!(
            "line {}: empty element line",
            line_index + 1
        )));
    }

    let mut nodes = [0u32; N];
    for (slot, node) in nodes.iter_mut().enumerate() {
        let token = tokens.next().ok_or_else(|| {
            Error::format(format!(
                "line {}: expected {} node indices, found {}",
                line_index + 1,
                N,
                slot
            ))
        })?;
        *node = parse_u32(token).ok_or_else(|| Error::numeric(line_index, token))?;
    }

    Ok(nodes)
}

/// Parse the first `N` integer fields of a header line.
///
/// `what` names the header in error messages ("node block header", ...).
pub fn parse_header<const N: usize>(
    line: &str,
    line_index: usize,
    what: &str,
) -> Result<[usize; N]> {
    let tokens: Vec<&str> = line.split_ascii_whitespace().take(N).collect();
    if tokens.len() < N {
        return Err(Error::format(format!(
            "line {}: {} needs {} fields, found {}",
            line_index + 1,
            what,
            N,
            tokens.len()
        )));
    }

    let mut fields = [0usize; N];
    for (field, token) in fields.iter_mut().zip(&tokens) {
        *field = parse_usize(token).ok_or_else(|| Error::numeric(line_index, token))?;
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_coordinates() {
        let node = parse_coordinates("0.5 -2.25 1e-3", 0).unwrap();
        assert_relative_eq!(node.x, 0.5);
        assert_relative_eq!(node.y, -2.25);
        assert_relative_eq!(node.z, 1e-3);
    }

    #[test]
    fn test_parse_coordinates_promotes_z() {
        let node = parse_coordinates("1 2", 0).unwrap();
        assert_eq!(node.z, 0.0);
    }

    #[test]
    fn test_parse_coordinates_rejects_garbage() {
        match parse_coordinates("1.0 abc 0", 41) {
            Err(Error::NumericParse { line, token }) => {
                assert_eq!(line, 42);
                assert_eq!(token, "abc");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            parse_coordinates("1.0", 0),
            Err(Error::FileFormat(_))
        ));
    }

    #[test]
    fn test_parse_coordinates_ignores_parametric_values() {
        let node = parse_coordinates("1 2 3 0.25 0.75", 0).unwrap();
        assert_eq!((node.x, node.y, node.z), (1.0, 2.0, 3.0));

        assert!(matches!(parse_coordinates("", 6), Err(Error::FileFormat(_))));
        assert!(matches!(
            parse_coordinates("1 2 zz", 6),
            Err(Error::NumericParse { line: 7, .. })
        ));
    }

    #[test]
    fn test_parse_element_nodes_skips_tag() {
        let tet: [u32; 4] = parse_element_nodes("17 4 9 2 11", 0).unwrap();
        assert_eq!(tet, [4, 9, 2, 11]);
    }

    #[test]
    fn test_parse_element_nodes_short_line() {
        let result: Result<[u32; 3]> = parse_element_nodes("5 1 2", 3);
        assert!(matches!(result, Err(Error::FileFormat(_))));

        let result: Result<[u32; 3]> = parse_element_nodes("5 1 -2 3", 3);
        assert!(matches!(result, Err(Error::NumericParse { line: 4, .. })));
    }

    #[test]
    fn test_parse_header() {
        let [blocks, nodes, min, max] = parse_header::<4>("3 120 1 120", 0, "header").unwrap();
        assert_eq!((blocks, nodes, min, max), (3, 120, 1, 120));
        assert!(parse_header::<4>("3 120", 0, "header").is_err());
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(b""), 0);
        assert_eq!(count_lines(b"a\nb\n"), 2);
        assert_eq!(count_lines(b"a\nb"), 2);
    }
}
