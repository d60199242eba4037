// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe Shapes CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use polyframe_shapes::cli::Reporter;
use polyframe_shapes::shapes::find_circles;
use polyframe_shapes::{detect_shapes, io, DetectionConfig, Polymesh};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "polyframe-shapes")]
#[command(about = "Polyframe Shapes - plane and cylinder extraction from triangle meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect planes, rectangles and cylinders in an STL file
    Detect {
        /// Input STL file
        input: PathBuf,

        /// Detection config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write plane face lists
        #[arg(long)]
        planes: Option<PathBuf>,

        /// Write cylinder face lists
        #[arg(long)]
        cylinders: Option<PathBuf>,

        /// Override the vertex weld distance
        #[arg(long)]
        weld: Option<f64>,
    },

    /// List circles through mesh vertices
    Circles {
        /// Input STL file
        input: PathBuf,

        /// Detection config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the default configuration
    Config {
        /// Output TOML file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let result = match &cli.command {
        Commands::Detect {
            input,
            config,
            json,
            planes,
            cylinders,
            weld,
        } => detect_command(
            input,
            config.as_deref(),
            json.as_deref(),
            planes.as_deref(),
            cylinders.as_deref(),
            *weld,
        ),
        Commands::Circles { input, config } => circles_command(input, config.as_deref()),
        Commands::Config { output } => config_command(output),
    };

    if let Err(ref e) = result {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<DetectionConfig> {
    match path {
        Some(path) => DetectionConfig::from_file(path),
        None => Ok(DetectionConfig::default()),
    }
}

fn load_polymesh(input: &Path, config: &DetectionConfig) -> Result<Polymesh> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let mesh = io::import_stl(input)?;
    Ok(Polymesh::from_mesh(&mesh, config.weld_epsilon))
}

fn detect_command(
    input: &Path,
    config_path: Option<&Path>,
    json: Option<&Path>,
    planes: Option<&Path>,
    cylinders: Option<&Path>,
    weld: Option<f64>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(weld) = weld {
        config.weld_epsilon = weld;
    }

    let polymesh = load_polymesh(input, &config)?;
    let start = Instant::now();
    let report = detect_shapes(&polymesh, &config)
        .with_context(|| format!("Shape detection failed for {}", input.display()))?;
    let duration = start.elapsed();

    Reporter::report_detection(&input.display().to_string(), &report, duration);
    if !report.diagnostics.is_empty() {
        Reporter::report_warning(&format!(
            "{} diagnostic(s) raised; results may be approximate",
            report.diagnostics.len()
        ));
    }

    if let Some(path) = json {
        io::export_report_json(&report, path)?;
        Reporter::success(&format!("Report written to {}", path.display()));
    }
    if let Some(path) = planes {
        io::write_face_lists(&report.plane_face_lists(), path)?;
        Reporter::success(&format!("Plane faces written to {}", path.display()));
    }
    if let Some(path) = cylinders {
        io::write_face_lists(&report.cylinder_face_lists(), path)?;
        Reporter::success(&format!("Cylinder faces written to {}", path.display()));
    }

    Ok(())
}

fn circles_command(input: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let polymesh = load_polymesh(input, &config)?;
    let circles = find_circles(&polymesh, &config);
    Reporter::report_circles(&input.display().to_string(), &circles);
    Ok(())
}

fn config_command(output: &Path) -> Result<()> {
    DetectionConfig::default().save(output)?;
    Reporter::success(&format!("Default configuration written to {}", output.display()));
    Ok(())
}
