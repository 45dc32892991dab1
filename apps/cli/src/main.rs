// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! gmsh2mtc - convert GMSH v4 ASCII meshes to MTC solver meshes.
//!
//! Defaults come from the environment (`GMSH_MTC_THREADS`,
//! `GMSH_MTC_DIMENSION`, `GMSH_MTC_OUTPUT_DIR`); command line flags override
//! them. Logs go to stderr and are filtered with `RUST_LOG`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use gmsh_mtc_core::Dimension;
use gmsh_mtc_processing::{ConvertConfig, MeshConverter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert GMSH v4 meshes to MTC format", long_about = None)]
struct Args {
    /// Input GMSH (.msh) files
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (single input only; defaults to input with .t extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory receiving the converted files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Mesh dimension: 2 or 3 (default: detect from z coordinates)
    #[arg(short, long)]
    dimension: Option<Dimension>,

    /// Number of worker threads (default: all available)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Print a JSON conversion report per file on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.output.is_some() && args.inputs.len() > 1 {
        bail!("--output can only be used with a single input file");
    }

    let mut config = ConvertConfig::from_env();
    if let Some(threads) = args.threads {
        config = config.with_threads(threads);
    }
    if let Some(dimension) = args.dimension {
        config = config.with_dimension(dimension);
    }
    if let Some(dir) = args.output_dir {
        config = config.with_output_dir(dir);
    }

    let converter = MeshConverter::new(config)?;
    tracing::info!(
        files = args.inputs.len(),
        threads = converter.config().threads,
        "Starting conversion"
    );

    for input in &args.inputs {
        let report = match &args.output {
            Some(output) => converter.convert(input, output),
            None => converter.convert_to_dir(input),
        }
        .with_context(|| format!("failed to convert {}", input.display()))?;

        if args.json {
            println!("{}", report.to_json()?);
        } else {
            tracing::info!(
                output = %report.output.display(),
                nodes = report.stats.nodes,
                elements = report.stats.main_elements,
                boundary = report.stats.boundary_elements,
                "Wrote MTC mesh"
            );
        }
    }

    Ok(())
}
