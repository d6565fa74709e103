use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use sqlerd::layout::{GroupingStrategy, Layout, LayoutConfig, Viewport, ViewportFit};
use sqlerd::schema::Table;
use sqlerd::session::Session;
use sqlerd::sql::{export_tables, Skipped};
use sqlerd::svg::SvgRenderer;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Svg,
    Json,
    Sql,
}

#[derive(Parser)]
#[command(name = "sqlerd")]
#[command(version)]
#[command(about = "Render MySQL CREATE TABLE statements as an ER diagram", long_about = None)]
struct Cli {
    /// Input SQL file, or - for stdin
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Svg)]
    format: Format,

    /// Viewport width used for the start point and fit
    #[arg(long, default_value_t = 1200.0)]
    width: f64,

    /// Viewport height used for the start point and fit
    #[arg(long, default_value_t = 800.0)]
    height: f64,

    /// JSON file overriding layout constants
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emphasize a table and its direct neighbours (svg only)
    #[arg(long)]
    highlight: Option<String>,

    /// Print the CREATE TABLE statement for a single table
    #[arg(long)]
    export: Option<String>,

    /// Grouping of related tables: greedy or connected
    #[arg(long, value_parser = parse_grouping)]
    grouping: Option<GroupingStrategy>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    tables: &'a [Table],
    skipped: &'a [Skipped],
    layout: &'a Layout,
    fit: Option<ViewportFit>,
}

fn parse_grouping(s: &str) -> Result<GroupingStrategy, String> {
    GroupingStrategy::from_str(&s.to_ascii_lowercase())
        .ok_or_else(|| format!("unknown grouping '{s}' (expected greedy or connected)"))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_config(cli: &Cli) -> Result<LayoutConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            LayoutConfig::from_json(&json)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => LayoutConfig::default(),
    };
    if let Some(grouping) = cli.grouping {
        config.grouping = grouping;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let input = read_input(&cli.input)?;
    let config = load_config(&cli)?;
    let metrics = config.metrics.clone();
    let viewport = Viewport {
        width: cli.width,
        height: cli.height,
    };

    let mut session = Session::new(config)?;
    let submission = session.submit(&input);
    for skipped in &submission.report.skipped {
        tracing::warn!(?skipped, "fragment not diagrammed");
    }

    let output = if let Some(name) = &cli.export {
        session.export_table(name)?
    } else {
        match cli.format {
            Format::Sql => export_tables(session.tables()),
            Format::Json => {
                let pass = session.layout(viewport);
                let out = JsonOutput {
                    tables: session.tables(),
                    skipped: &submission.report.skipped,
                    layout: &pass.layout,
                    fit: pass.fit,
                };
                serde_json::to_string_pretty(&out)?
            }
            Format::Svg => {
                let highlighted = match &cli.highlight {
                    Some(name) => Some(session.highlight(name)?),
                    None => None,
                };
                let pass = session.layout(viewport);
                SvgRenderer::new(metrics).render_highlighted(
                    session.tables(),
                    &pass.layout,
                    highlighted.as_deref(),
                )
            }
        }
    };

    match &cli.output {
        Some(path) => fs::write(path, &output)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{}", output),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
