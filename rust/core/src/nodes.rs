// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node section parsing
//!
//! GMSH v4 groups nodes into entity blocks:
//!
//! ```text
//! $Nodes
//! numEntityBlocks numNodes minNodeTag maxNodeTag
//! entityDim entityTag parametric numNodesInBlock
//! nodeTag                  (numNodesInBlock lines, skipped)
//! x y z                    (numNodesInBlock lines, parsed)
//! ...
//! $EndNodes
//! ```
//!
//! Node identity is positional: the n-th coordinate line of the section is
//! node `n` (1-based). A cheap sequential scan locates the coordinate lines of
//! every block, then the blocks are parsed in parallel straight into disjoint
//! slices of the pre-sized node array.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::fast_parse::{parse_coordinates, parse_header};
use crate::sections::Sections;
use crate::Node;

/// Lines per parallel work item inside a single block
const PARSE_CHUNK: usize = 16 * 1024;

/// Location of one block's coordinate lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeBlock {
    /// Line index of the first coordinate line
    pub coord_line: usize,
    /// Number of nodes in the block
    pub count: usize,
    /// Write offset into the dense node array
    pub offset: usize,
}

/// Sequentially walk the block headers of the node section.
///
/// Returns the declared node count and one [`NodeBlock`] per entity block.
pub fn scan_node_blocks(lines: &[&str], sections: &Sections) -> Result<(usize, Vec<NodeBlock>)> {
    let header_line = sections.node_header();
    let [num_blocks, num_nodes, _, _] =
        parse_header::<4>(lines[header_line], header_line, "node section header")?;

    let mut line = header_line + 1;
    // Each block takes at least one line of the section
    let mut blocks = Vec::with_capacity(num_blocks.min(sections.nodes_end - line));
    let mut offset = 0usize;

    for block in 0..num_blocks {
        if line >= sections.nodes_end {
            return Err(Error::format(format!(
                "node section ends before block {} of {}",
                block + 1,
                num_blocks
            )));
        }

        let [_, _, _, count] = parse_header::<4>(lines[line], line, "node block header")?;
        let span = count
            .checked_mul(2)
            .and_then(|body| body.checked_add(line + 1));
        let Some(end) = span.filter(|&end| end <= sections.nodes_end) else {
            return Err(Error::format(format!(
                "node block at line {} declares {} nodes but the section ends at line {}",
                line + 1,
                count,
                sections.nodes_end + 1
            )));
        };
        let coord_line = line + 1 + count;

        blocks.push(NodeBlock {
            coord_line,
            count,
            offset,
        });
        offset += count;
        line = end;
    }

    if offset != num_nodes {
        return Err(Error::format(format!(
            "node section declares {} nodes but its blocks hold {}",
            num_nodes, offset
        )));
    }

    Ok((num_nodes, blocks))
}

/// Parse all node coordinates into a dense array (index 0 is node 1).
pub fn parse_nodes(lines: &[&str], sections: &Sections) -> Result<Vec<Node>> {
    let (total, blocks) = scan_node_blocks(lines, sections)?;

    let mut nodes = vec![Node::origin(); total];

    // Carve the array into one disjoint slice per block
    let mut rest = nodes.as_mut_slice();
    let mut jobs = Vec::with_capacity(blocks.len());
    for block in &blocks {
        debug_assert_eq!(block.offset, total - rest.len());
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(block.count);
        jobs.push((block, head));
        rest = tail;
    }

    jobs.into_par_iter().try_for_each(|(block, target)| {
        target
            .par_chunks_mut(PARSE_CHUNK)
            .enumerate()
            .try_for_each(|(chunk_index, chunk)| {
                let first = block.coord_line + chunk_index * PARSE_CHUNK;
                for (i, node) in chunk.iter_mut().enumerate() {
                    let line = first + i;
                    *node = parse_coordinates(lines[line], line)?;
                }
                Ok::<(), Error>(())
            })
    })?;

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::split_lines;
    use approx::assert_relative_eq;

    const TWO_BLOCKS: &str = "\
$Nodes
2 3 1 3
0 1 0 1
1
0.0 0.0 0.0
2 1 0 2
2
3
1.5 0.0 0.0
0.0 2.5 -1.0
$EndNodes
$Elements
0 0 0 0
$EndElements
";

    #[test]
    fn test_scan_node_blocks() {
        let lines = split_lines(TWO_BLOCKS);
        let sections = Sections::locate(&lines).unwrap();
        let (total, blocks) = scan_node_blocks(&lines, &sections).unwrap();

        assert_eq!(total, 3);
        assert_eq!(
            blocks,
            vec![
                NodeBlock { coord_line: 4, count: 1, offset: 0 },
                NodeBlock { coord_line: 8, count: 2, offset: 1 },
            ]
        );
    }

    #[test]
    fn test_parse_nodes_positional() {
        let lines = split_lines(TWO_BLOCKS);
        let sections = Sections::locate(&lines).unwrap();
        let nodes = parse_nodes(&lines, &sections).unwrap();

        assert_eq!(nodes.len(), 3);
        assert_relative_eq!(nodes[1].x, 1.5);
        assert_relative_eq!(nodes[2].y, 2.5);
        assert_relative_eq!(nodes[2].z, -1.0);
    }

    #[test]
    fn test_count_mismatch() {
        let content = TWO_BLOCKS.replace("2 3 1 3", "2 4 1 4");
        let lines = split_lines(&content);
        let sections = Sections::locate(&lines).unwrap();
        let err = parse_nodes(&lines, &sections).unwrap_err();
        assert!(matches!(err, Error::FileFormat(_)), "{}", err);
    }

    #[test]
    fn test_block_overruns_section() {
        let content = TWO_BLOCKS.replace("2 1 0 2", "2 1 0 5");
        let lines = split_lines(&content);
        let sections = Sections::locate(&lines).unwrap();
        assert!(matches!(
            scan_node_blocks(&lines, &sections),
            Err(Error::FileFormat(_))
        ));
    }

    #[test]
    fn test_bad_coordinate_reports_line() {
        let content = TWO_BLOCKS.replace("1.5 0.0 0.0", "1.5 x 0.0");
        let lines = split_lines(&content);
        let sections = Sections::locate(&lines).unwrap();
        match parse_nodes(&lines, &sections) {
            Err(Error::NumericParse { line, token }) => {
                assert_eq!(line, 9);
                assert_eq!(token, "x");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_short_block_header() {
        let content = TWO_BLOCKS.replace("2 1 0 2", "2 1 0");
        let lines = split_lines(&content);
        let sections = Sections::locate(&lines).unwrap();
        assert!(matches!(
            parse_nodes(&lines, &sections),
            Err(Error::FileFormat(_))
        ));
    }

    #[test]
    fn test_huge_block_count_is_format_error() {
        let content = TWO_BLOCKS.replace("2 3 1 3", "18446744073709551615 3 1 3");
        let lines = split_lines(&content);
        let sections = Sections::locate(&lines).unwrap();
        assert!(matches!(
            scan_node_blocks(&lines, &sections),
            Err(Error::FileFormat(_))
        ));
    }

    #[test]
    fn test_huge_block_size_is_format_error() {
        let content = TWO_BLOCKS.replace("2 1 0 2", "2 1 0 18446744073709551615");
        let lines = split_lines(&content);
        let sections = Sections::locate(&lines).unwrap();
        assert!(matches!(
            parse_nodes(&lines, &sections),
            Err(Error::FileFormat(_))
        ));

        let content = TWO_BLOCKS.replace("2 1 0 2", "2 1 0 9223372036854775808");
        let lines = split_lines(&content);
        let sections = Sections::locate(&lines).unwrap();
        assert!(matches!(
            parse_nodes(&lines, &sections),
            Err(Error::FileFormat(_))
        ));
    }
}
