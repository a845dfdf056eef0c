//! Lays out an analysis JSON document and prints it as text or JSON.
//!
//! Usage:
//!   whiteboard analysis.json
//!   cat analysis.json | whiteboard --direction lr --risks
//!   whiteboard analysis.json --config canvas.json --format json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use whiteboard_ascii_render::{AsciiRenderOptions, render_ascii};
use whiteboard_canvas::{Canvas, CanvasConfig, ViewportState};
use whiteboard_graph::{AnalysisResult, Direction, GraphSnapshot};

#[derive(Parser, Debug)]
#[command(name = "whiteboard")]
#[command(about = "Lay out an issue-tree analysis as a node graph")]
struct Args {
    /// Analysis JSON file (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Canvas configuration JSON (layout, viewport, build options)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Flow direction, overrides the config file
    #[arg(long, short = 'd', value_enum)]
    direction: Option<FlowArg>,

    /// Output width in characters
    #[arg(long, default_value_t = 120)]
    width: usize,

    /// Output height in characters
    #[arg(long, default_value_t = 40)]
    height: usize,

    /// Attach implementation risks under the hypothesis
    #[arg(long)]
    risks: bool,

    #[arg(long, short = 'f', value_enum, default_value_t = Format::Ascii)]
    format: Format,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FlowArg {
    Tb,
    Lr,
}

impl From<FlowArg> for Direction {
    fn from(value: FlowArg) -> Self {
        match value {
            FlowArg::Tb => Direction::TB,
            FlowArg::Lr => Direction::LR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Ascii,
    Json,
}

#[derive(Serialize)]
struct JsonOutput {
    snapshot: GraphSnapshot,
    viewport: ViewportState,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let input = read_input(args.input.as_ref())?;

    let analysis = AnalysisResult::from_json(&input).context("invalid analysis document")?;
    let mut canvas =
        Canvas::from_analysis(&analysis, config).context("failed to build whiteboard")?;
    debug!(
        nodes = canvas.store().node_count(),
        edges = canvas.store().edge_count(),
        "whiteboard ready"
    );

    let options = AsciiRenderOptions {
        columns: args.width,
        rows: args.height,
        node_size: canvas.config().layout.node_size,
        direction: canvas.config().layout.direction,
        ..AsciiRenderOptions::default()
    };
    canvas.fit_to(options.screen_size(), options.cell_width * 2.0);

    match args.format {
        Format::Ascii => {
            println!("{}", render_ascii(&canvas.snapshot(), &canvas.viewport_state(), &options));
        }
        Format::Json => {
            let output = JsonOutput {
                snapshot: canvas.snapshot(),
                viewport: canvas.viewport_state(),
            };
            let json = serde_json::to_string_pretty(&output).context("failed to encode snapshot")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<CanvasConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => CanvasConfig::default(),
    };
    if let Some(direction) = args.direction {
        config.layout.direction = direction.into();
    }
    if args.risks {
        config.build.include_risks = true;
    }
    Ok(config)
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}
