//! Score Table - query a scoring table from the command line
//!
//! Loads a JSON or CSV scoring table, groups it by discipline and gender,
//! and prints the records matching a discipline selection and/or an exact
//! point value.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::fmt::Write;
use wa_score_comparator::config::BrowserConfig;
use wa_score_comparator::loader::{self, LoadedData, Source, SourceFormat};
use wa_score_comparator::params::{parse_point_input, QueryParams};
use wa_score_comparator::query::query;
use wa_score_comparator::render::{render_params, render_views};
use wa_score_comparator::Gender;

#[derive(Parser)]
#[command(name = "score-table")]
#[command(about = "Look up scoring-table records by discipline and points")]
struct Cli {
    /// Scoring table to load (path or http(s) URL).
    /// Falls back to the `source` entry of ~/.wa-score-comparator.conf.
    #[arg(short, long, global = true, env = "WA_SCORE_SOURCE")]
    source: Option<String>,

    /// Source format (json or csv); detected from the extension if omitted
    #[arg(short, long, global = true)]
    format: Option<SourceFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print records for the selected disciplines and/or point value
    Query {
        /// Discipline to show; repeat for several (shown in the order given)
        #[arg(short, long = "discipline")]
        disciplines: Vec<String>,

        /// Show only records with exactly this many points (1-1400)
        #[arg(short, long)]
        points: Option<String>,

        /// With no discipline and no points, print every table instead of the prompt
        #[arg(long)]
        all: bool,

        /// Print the matching tables as JSON
        #[arg(long)]
        json: bool,
    },

    /// List disciplines with their record counts
    Disciplines,

    /// Show how many rows were loaded and dropped
    Stats,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let location = cli
        .source
        .clone()
        .unwrap_or_else(|| BrowserConfig::load().source);
    let source = Source::new(location).with_format(cli.format);
    let data = loader::load(&source)?;

    match cli.command {
        Commands::Query {
            disciplines,
            points,
            all,
            json,
        } => {
            let points = match points {
                Some(p) => parse_point_input(&p).map_err(|e| anyhow!("--points: {}", e))?,
                None => None,
            };
            let params = QueryParams::new()
                .with_selection(disciplines)
                .with_points(points);
            if json {
                println!("{}", query_json(&data, &params)?);
            } else {
                print!("{}", run_query(&data, &params, all)?);
            }
        }
        Commands::Disciplines => {
            print!("{}", list_disciplines(&data)?);
        }
        Commands::Stats => {
            print!("{}", format_stats(&source, &data)?);
        }
    }

    Ok(())
}

fn run_query(data: &LoadedData, params: &QueryParams, all: bool) -> Result<String> {
    if all && params.is_idle() {
        render_views(query(&data.index, params))
    } else {
        render_params(&data.index, params)
    }
}

/// Machine-readable output skips the idle prompt and always answers the query.
fn query_json(data: &LoadedData, params: &QueryParams) -> Result<String> {
    let views = query(&data.index, params);
    serde_json::to_string_pretty(&views).context("Failed to serialize query output")
}

fn list_disciplines(data: &LoadedData) -> Result<String> {
    let width = data
        .index
        .disciplines()
        .map(|d| d.chars().count())
        .max()
        .unwrap_or(0)
        .max("Discipline".len());

    let mut out = String::new();
    writeln!(out, "{:<w$} {:>6} {:>6}", "Discipline", "Male", "Female", w = width)?;
    writeln!(out, "{:-<w$}", "", w = width + 14)?;
    for (name, buckets) in data.index.iter() {
        writeln!(
            out,
            "{:<w$} {:>6} {:>6}",
            name,
            buckets.get(Gender::Male).len(),
            buckets.get(Gender::Female).len(),
            w = width
        )?;
    }
    Ok(out)
}

fn format_stats(source: &Source, data: &LoadedData) -> Result<String> {
    let s = &data.stats;
    let mut out = String::new();
    writeln!(out, "Source:              {}", source)?;
    writeln!(out, "Rows read:           {}", s.rows)?;
    writeln!(out, "Records indexed:     {}", s.indexed)?;
    writeln!(out, "Malformed rows:      {}", s.malformed)?;
    writeln!(out, "Unrecognized gender: {}", s.unrecognized_gender)?;
    writeln!(out, "Disciplines:         {}", s.disciplines)?;
    Ok(out)
}
