// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element section parsing
//!
//! ```text
//! $Elements
//! numEntityBlocks numElements minElementTag maxElementTag
//! entityDim entityTag elementType numElementsInBlock
//! elementTag n1 n2 ...     (numElementsInBlock lines)
//! ...
//! $EndElements
//! ```
//!
//! Only blocks of the requested element type are collected; everything else
//! (points, lines, surface triangles of a volume mesh) is skipped.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::fast_parse::{parse_element_nodes, parse_header};
use crate::sections::Sections;

/// GMSH element type code of a 3-node triangle
pub const TRIANGLE: u32 = 2;
/// GMSH element type code of a 4-node tetrahedron
pub const TETRAHEDRON: u32 = 4;

const PARSE_CHUNK: usize = 16 * 1024;

/// Location of one matching element block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementBlock {
    /// Line index of the first element line
    pub first_line: usize,
    pub count: usize,
    /// Write offset into the dense element array
    pub offset: usize,
}

/// Walk the element block headers, keeping blocks of `element_type`.
///
/// Returns the number of matching elements and their blocks.
pub fn scan_element_blocks(
    lines: &[&str],
    sections: &Sections,
    element_type: u32,
) -> Result<(usize, Vec<ElementBlock>)> {
    let header_line = sections.element_header();
    let [num_blocks, num_elements, _, _] =
        parse_header::<4>(lines[header_line], header_line, "element section header")?;

    let mut blocks = Vec::new();
    let mut line = header_line + 1;
    let mut matched = 0usize;
    let mut seen = 0usize;

    for block in 0..num_blocks {
        if line >= sections.elements_end {
            return Err(Error::format(format!(
                "element section ends before block {} of {}",
                block + 1,
                num_blocks
            )));
        }

        let [_, _, block_type, count] =
            parse_header::<4>(lines[line], line, "element block header")?;
        let first_line = line + 1;
        let Some(end) = first_line
            .checked_add(count)
            .filter(|&end| end <= sections.elements_end)
        else {
            return Err(Error::format(format!(
                "element block at line {} declares {} elements but the section ends at line {}",
                line + 1,
                count,
                sections.elements_end + 1
            )));
        };

        if block_type == element_type as usize {
            blocks.push(ElementBlock {
                first_line,
                count,
                offset: matched,
            });
            matched += count;
        }
        seen += count;
        line = end;
    }

    if seen != num_elements {
        return Err(Error::format(format!(
            "element section declares {} elements but its blocks hold {}",
            num_elements, seen
        )));
    }

    Ok((matched, blocks))
}

/// Parse all elements of `element_type` with `N` nodes each.
///
/// Indices are kept 1-based as written; each one is checked against
/// `node_count` so every parsed element references an existing node.
pub fn parse_elements<const N: usize>(
    lines: &[&str],
    sections: &Sections,
    element_type: u32,
    node_count: usize,
) -> Result<Vec<[u32; N]>> {
    let (total, blocks) = scan_element_blocks(lines, sections, element_type)?;

    let mut elements = vec![[0u32; N]; total];

    let mut rest = elements.as_mut_slice();
    let mut jobs = Vec::with_capacity(blocks.len());
    for block in &blocks {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(block.count);
        jobs.push((block, head));
        rest = tail;
    }

    jobs.into_par_iter().try_for_each(|(block, target)| {
        target
            .par_chunks_mut(PARSE_CHUNK)
            .enumerate()
            .try_for_each(|(chunk_index, chunk)| {
                let first = block.first_line + chunk_index * PARSE_CHUNK;
                for (i, element) in chunk.iter_mut().enumerate() {
                    let line = first + i;
                    *element = parse_element_nodes::<N>(lines[line], line)?;
                    if let Some(&bad) = element
                        .iter()
                        .find(|&&index| index == 0 || index as usize > node_count)
                    {
                        return Err(Error::format(format!(
                            "line {}: node index {} outside 1..={}",
                            line + 1,
                            bad,
                            node_count
                        )));
                    }
                }
                Ok(())
            })
    })?;

    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::split_lines;

    const MIXED: &str = "\
$Nodes
1 4 1 4
2 1 0 4
1
2
3
4
0 0 0
1 0 0
1 1 0
0 1 0
$EndNodes
$Elements
3 7 1 7
1 1 1 4
1 1 2
2 2 3
3 3 4
4 4 1
2 1 2 1
5 1 2 3
2 2 2 2
6 1 3 4
7 3 4 1
$EndElements
";

    #[test]
    fn test_only_matching_blocks_are_collected() {
        let lines = split_lines(MIXED);
        let sections = Sections::locate(&lines).unwrap();
        let (total, blocks) = scan_element_blocks(&lines, &sections, TRIANGLE).unwrap();

        assert_eq!(total, 3);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].offset, 1);
        assert_eq!(blocks[1].count, 2);
    }

    #[test]
    fn test_parse_triangles() {
        let lines = split_lines(MIXED);
        let sections = Sections::locate(&lines).unwrap();
        let triangles = parse_elements::<3>(&lines, &sections, TRIANGLE, 4).unwrap();
        assert_eq!(triangles, vec![[1, 2, 3], [1, 3, 4], [3, 4, 1]]);
    }

    #[test]
    fn test_no_matching_blocks() {
        let lines = split_lines(MIXED);
        let sections = Sections::locate(&lines).unwrap();
        let tets = parse_elements::<4>(&lines, &sections, TETRAHEDRON, 4).unwrap();
        assert!(tets.is_empty());
    }

    #[test]
    fn test_out_of_range_index() {
        let content = MIXED.replace("6 1 3 4", "6 1 3 9");
        let lines = split_lines(&content);
        let sections = Sections::locate(&lines).unwrap();
        let err = parse_elements::<3>(&lines, &sections, TRIANGLE, 4).unwrap_err();
        assert!(err.to_string().contains("node index 9"), "{}", err);

        let content = MIXED.replace("5 1 2 3", "5 0 2 3");
        let lines = split_lines(&content);
        let sections = Sections::locate(&lines).unwrap();
        assert!(parse_elements::<3>(&lines, &sections, TRIANGLE, 4).is_err());
    }

    #[test]
    fn test_declared_total_mismatch() {
        let content = MIXED.replace("3 7 1 7", "3 8 1 8");
        let lines = split_lines(&content);
        let sections = Sections::locate(&lines).unwrap();
        assert!(matches!(
            scan_element_blocks(&lines, &sections, TRIANGLE),
            Err(Error::FileFormat(_))
        ));
    }

    #[test]
    fn test_huge_counts_are_format_errors() {
        let content = MIXED.replace("2 1 2 1", "2 1 2 18446744073709551615");
        let lines = split_lines(&content);
        let sections = Sections::locate(&lines).unwrap();
        assert!(matches!(
            parse_elements::<3>(&lines, &sections, TRIANGLE, 4),
            Err(Error::FileFormat(_))
        ));

        let content = MIXED.replace("3 7 1 7", "18446744073709551615 7 1 7");
        let lines = split_lines(&content);
        let sections = Sections::locate(&lines).unwrap();
        assert!(matches!(
            scan_element_blocks(&lines, &sections, TRIANGLE),
            Err(Error::FileFormat(_))
        ));
    }
}
