// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GMSH to MTC conversion pipeline with strict stage barriers.
//!
//! Each conversion owns a dedicated rayon pool. Every stage fans out over
//! the pool and joins before the next one starts; the pool is dropped (and
//! its threads released) when the conversion returns, successfully or not.

use std::path::{Path, PathBuf};
use std::time::Instant;

use gmsh_mtc_core::{parse_nodes, split_lines, Dimension, Node, Sections};
use serde::Serialize;

use crate::boundary::{detect_boundary, FacetCounts};
use crate::compact::compact_nodes;
use crate::config::ConvertConfig;
use crate::error::{Result, Stage, StageContext};
use crate::kind::{MeshKind, Planar, Volumetric};
use crate::writer::MtcDocument;

/// Wall time of one stage
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed_ms: f64,
}

/// Counts and timings of a conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConversionStats {
    pub dimension: Dimension,
    pub threads: usize,
    /// Nodes declared by the input file
    pub input_nodes: usize,
    /// Nodes written to the output
    pub nodes: usize,
    pub removed_nodes: usize,
    pub main_elements: usize,
    pub boundary_elements: usize,
    pub facets: FacetCounts,
    /// Whether the 2D winding flip was applied
    pub flipped: bool,
    pub timings: Vec<StageTiming>,
    pub total_ms: f64,
}

/// Result of a file conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub stats: ConversionStats,
}

impl ConversionReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// An in-memory conversion: formatted output plus statistics
#[derive(Debug)]
pub struct Conversion {
    pub document: MtcDocument,
    pub stats: ConversionStats,
}

/// Main elements as parsed, before the dimension-specific stages
enum ParsedElements {
    Triangles(Vec<[u32; 3]>),
    Tetrahedra(Vec<[u32; 4]>),
}

/// Records stage durations and logs stage completion
#[derive(Default)]
struct StageTimer {
    timings: Vec<StageTiming>,
}

impl StageTimer {
    fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(stage = %stage, elapsed_ms, "Stage complete");
        self.timings.push(StageTiming { stage, elapsed_ms });
        out
    }

    fn try_time<T, E>(&mut self, stage: Stage, f: impl FnOnce() -> std::result::Result<T, E>) -> Result<T>
    where
        E: Into<gmsh_mtc_core::Error>,
    {
        self.time(stage, f).in_stage(stage)
    }
}

/// Output path for `input`: same stem with a `.t` extension, inside
/// `output_dir` when given, otherwise next to the input.
pub fn output_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let file_name = input.with_extension("t");
    match (output_dir, file_name.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => file_name,
    }
}

/// GMSH v4 to MTC converter
#[derive(Debug, Clone)]
pub struct MeshConverter {
    config: ConvertConfig,
}

impl MeshConverter {
    pub fn new(config: ConvertConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Convert `input` into the configured output directory (or next to the
    /// input), naming the result after the input with a `.t` extension.
    pub fn convert_to_dir(&self, input: &Path) -> Result<ConversionReport> {
        let output = output_path_for(input, self.config.output_dir.as_deref());
        self.convert(input, &output)
    }

    /// Convert the GMSH file at `input` and write the MTC file to `output`.
    pub fn convert(&self, input: &Path, output: &Path) -> Result<ConversionReport> {
        let pool = self.build_pool()?;
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            threads = self.config.threads,
            "Converting GMSH mesh"
        );

        let stats = pool.install(|| -> Result<ConversionStats> {
            let total = Instant::now();
            let mut timer = StageTimer::default();

            let content = timer.try_time(Stage::Reading, || std::fs::read_to_string(input))?;
            tracing::info!(bytes = content.len(), "File loaded");

            let (document, mut stats) = self.run(content, &mut timer)?;
            timer.try_time(Stage::OutputWriting, || document.save(output))?;

            stats.timings = timer.timings;
            stats.total_ms = total.elapsed().as_secs_f64() * 1000.0;
            Ok(stats)
        })?;

        tracing::info!(
            nodes = stats.nodes,
            elements = stats.main_elements,
            boundary = stats.boundary_elements,
            total_ms = stats.total_ms,
            "Conversion complete"
        );

        Ok(ConversionReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            stats,
        })
    }

    /// Convert GMSH content held in memory without touching the filesystem.
    pub fn convert_content(&self, content: String) -> Result<Conversion> {
        let pool = self.build_pool()?;
        pool.install(|| {
            let total = Instant::now();
            let mut timer = StageTimer::default();
            let (document, mut stats) = self.run(content, &mut timer)?;
            stats.timings = timer.timings;
            stats.total_ms = total.elapsed().as_secs_f64() * 1000.0;
            Ok(Conversion { document, stats })
        })
    }

    fn build_pool(&self) -> Result<rayon::ThreadPool> {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .thread_name(|i| format!("gmsh-mtc-{}", i))
            .build()?)
    }

    /// Parse, then run the dimension-specific stages. Consumes the content so
    /// the raw text is released as soon as parsing is done.
    fn run(&self, content: String, timer: &mut StageTimer) -> Result<(MtcDocument, ConversionStats)> {
        let (nodes, elements) = {
            let lines = split_lines(&content);
            tracing::debug!(lines = lines.len(), "Split input lines");

            let sections = timer.try_time(Stage::SectionLocation, || {
                let sections = Sections::locate(&lines)?;
                sections.check_mesh_format(&lines)?;
                Ok::<_, gmsh_mtc_core::Error>(sections)
            })?;

            let nodes = timer.try_time(Stage::NodeParsing, || parse_nodes(&lines, &sections))?;
            tracing::info!(nodes = nodes.len(), "Nodes parsed");

            let dimension = match self.config.dimension {
                Some(dimension) => dimension,
                None => {
                    let detected = Dimension::detect(&nodes);
                    tracing::info!(dimension = %detected, "Detected mesh dimension");
                    detected
                }
            };

            let elements = timer.try_time(Stage::ElementParsing, || match dimension {
                Dimension::Two => Planar::parse_elements(&lines, &sections, nodes.len())
                    .map(ParsedElements::Triangles),
                Dimension::Three => Volumetric::parse_elements(&lines, &sections, nodes.len())
                    .map(ParsedElements::Tetrahedra),
            })?;

            (nodes, elements)
        };
        drop(content);

        match elements {
            ParsedElements::Triangles(elements) => self.finish::<Planar>(nodes, elements, timer),
            ParsedElements::Tetrahedra(elements) => {
                self.finish::<Volumetric>(nodes, elements, timer)
            }
        }
    }

    /// Orientation, boundary detection, compaction and formatting.
    fn finish<K: MeshKind>(
        &self,
        mut nodes: Vec<Node>,
        mut elements: Vec<K::Element>,
        timer: &mut StageTimer,
    ) -> Result<(MtcDocument, ConversionStats)> {
        tracing::info!(count = elements.len(), "Parsed {}", K::ELEMENT_NAME);
        let input_nodes = nodes.len();

        let flipped = timer.time(Stage::Orientation, || K::orient(&mut elements, &nodes));

        let boundary = timer.time(Stage::BoundaryDetection, || detect_boundary::<K>(&elements));
        let mut facets = boundary.facets;
        tracing::info!(
            candidates = boundary.counts.candidates,
            boundary = boundary.counts.boundary,
            interior = boundary.counts.interior,
            "Boundary {} detected",
            K::FACET_NAME
        );

        let remap = timer.time(Stage::NodeCompaction, || {
            compact_nodes(&mut nodes, &mut elements, &mut facets)
        });
        tracing::info!(
            removed = remap.removed(),
            remaining = nodes.len(),
            "Unused nodes removed"
        );

        let document = timer.time(Stage::Formatting, || {
            MtcDocument::format::<K>(&nodes, &elements, &facets)
        });

        let stats = ConversionStats {
            dimension: K::DIMENSION,
            threads: self.config.threads,
            input_nodes,
            nodes: nodes.len(),
            removed_nodes: remap.removed(),
            main_elements: elements.len(),
            boundary_elements: facets.len(),
            facets: boundary.counts,
            flipped,
            timings: Vec::new(),
            total_ms: 0.0,
        };

        if stats.main_elements == 0 {
            tracing::warn!(
                element_type = K::ELEMENT_TYPE,
                "No {} found in the element section",
                K::ELEMENT_NAME
            );
        }

        Ok((document, stats))
    }
}
