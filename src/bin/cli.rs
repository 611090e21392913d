// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! kcl-run: evaluate a KCL script and print the result

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use kcl_engine::{EngineConfig, Evaluation, EvaluationOrder, Kernel, RunResult, Severity};
use std::io::Read;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kcl-run")]
#[command(about = "Evaluate a KCL modeling script", long_about = None)]
#[command(version)]
struct Cli {
    /// Script file; reads stdin when absent or `-`
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Print the full artifact graph instead of the run result
    #[arg(long, conflicts_with = "summary")]
    graph: bool,

    /// Print a human-readable summary
    #[arg(long)]
    summary: bool,

    /// Config file (defaults to ./kcl.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Evaluation order
    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    Category,
    Dependency,
}

impl From<OrderArg> for EvaluationOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Category => EvaluationOrder::Category,
            OrderArg::Dependency => EvaluationOrder::Dependency,
        }
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = EngineConfig::from_file(path)?;
            config.apply_overrides(|key| std::env::var(key).ok())?;
            config
        }
        None => EngineConfig::load()?,
    };
    if let Some(order) = cli.order {
        config.order = order.into();
    }
    Ok(config)
}

fn read_source(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display())),
        _ => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("Failed to read script from stdin")?;
            Ok(source)
        }
    }
}

fn print_json(value: &impl serde::Serialize, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let source = match read_source(cli.input.as_ref()) {
        Ok(source) => source,
        // The run-result contract reports input failures as JSON too
        Err(err) if !cli.graph && !cli.summary => {
            return print_json(&RunResult::failure(format!("{err:#}")), cli.pretty);
        }
        Err(err) => return Err(err),
    };

    let kernel = Kernel::with_config(config);
    let start = Instant::now();
    let evaluation = kernel.evaluate_script(&source);
    let elapsed = start.elapsed();

    if cli.graph {
        print_json(&evaluation, cli.pretty)
    } else if cli.summary {
        print_summary(&evaluation, elapsed);
        Ok(())
    } else {
        print_json(&RunResult::from_evaluation(&evaluation), cli.pretty)
    }
}

fn print_summary(evaluation: &Evaluation, elapsed: Duration) {
    let graph = &evaluation.graph;
    println!("{}", "━".repeat(60).bright_black());
    if evaluation.has_errors() {
        println!("{}", "Evaluated with errors".red().bold());
    } else {
        println!("{}", "Evaluated".green().bold());
    }
    println!("{}", "━".repeat(60).bright_black());

    println!("\n{}", "Artifacts:".bold());
    if graph.artifacts.is_empty() {
        println!("  {}", "(none visible)".bright_black());
    }
    for node in graph.visible() {
        let (vertices, triangles) = node
            .geometry
            .as_ref()
            .map_or((0, 0), |m| (m.vertex_count(), m.triangle_count()));
        println!(
            "  {:<24} {:>8} {} {:>8} {}",
            node.id.cyan(),
            vertices,
            "vertices".bright_black(),
            triangles,
            "triangles".bright_black()
        );
    }
    let bbox = graph.bounding_box();
    if !bbox.is_empty() {
        let [x0, y0, z0, x1, y1, z1] = bbox.to_array();
        println!(
            "\n{} [{x0:.3}, {y0:.3}, {z0:.3}] .. [{x1:.3}, {y1:.3}, {z1:.3}]",
            "Bounds:".bold()
        );
    }

    if !evaluation.diagnostics.is_empty() {
        println!("\n{}", "Diagnostics:".bold());
        for diagnostic in &evaluation.diagnostics {
            let text = diagnostic.to_string();
            let line = match diagnostic.severity {
                Severity::Error => text.red(),
                Severity::Warning => text.yellow(),
                Severity::Info => text.bright_black(),
            };
            println!("  {line}");
        }
    }

    println!("\n{} {:.2?}", "Time:".bright_black(), elapsed);
}
