//! Plain-text rendering of query results

use crate::index::GroupedIndex;
use crate::params::QueryParams;
use crate::query::{grouped, query, GroupView};
use anyhow::Result;
use std::fmt::{self, Write};

/// Shown instead of tables when nothing is selected and no points are entered
pub const IDLE_PROMPT: &str =
    "Please select a discipline or enter a scoring point to see the data.";

/// Shown when the query ran but nothing matched
pub const NO_MATCHES: &str = "No matching records.";

/// Render query output as one section per discipline, one table per gender.
pub fn render_views(views: Vec<GroupView<'_>>) -> Result<String> {
    let mut out = String::new();
    write_views(&mut out, views)?;
    Ok(out)
}

fn write_views(out: &mut String, views: Vec<GroupView<'_>>) -> fmt::Result {
    for (i, discipline) in grouped(views).into_iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(out, "{:=^60}", format!(" {} ", discipline.discipline))?;
        for group in &discipline.groups {
            write_table(out, group)?;
        }
    }
    Ok(())
}

fn write_table(out: &mut String, group: &GroupView<'_>) -> fmt::Result {
    let result_width = group
        .records
        .iter()
        .map(|r| r.result.to_string().chars().count())
        .max()
        .unwrap_or(0)
        .max("Result".len());

    writeln!(out, "\n{}", group.gender)?;
    writeln!(out, "{:>8} | {:<w$}", "Points", "Result", w = result_width)?;
    writeln!(out, "{:-<8}-+-{:-<w$}", "", "", w = result_width)?;
    for record in &group.records {
        writeln!(
            out,
            "{:>8} | {:<w$}",
            record.score,
            record.result.to_string(),
            w = result_width
        )?;
    }
    Ok(())
}

/// Render what a front end should show for `params`: the idle prompt, a
/// no-match notice, or the tables.
pub fn render_params(index: &GroupedIndex, params: &QueryParams) -> Result<String> {
    if params.is_idle() {
        return Ok(format!("{}\n", IDLE_PROMPT));
    }
    let views = query(index, params);
    if views.is_empty() {
        return Ok(format!("{}\n", NO_MATCHES));
    }
    render_views(views)
}
