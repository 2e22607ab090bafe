//! Per-expression report assembly: parse, tile, cost, emit, print.
//!
//! The report reproduces, in order: the original expression text, the
//! glyph-drawn tree, the tile coverings as ordered member-kind lists, the
//! `Custo Total` line, and the numbered instruction listing.

use std::fmt;

use crate::cost::{self, CostCache};
use crate::emit;
use crate::error::SelectResult;
use crate::ir;
use crate::tiler;

/// Everything the pipeline produces for one input expression.
#[derive(Debug)]
pub struct Report {
    pub expression: String,
    /// Rendered tree, one node per line, trailing newline included.
    pub tree: String,
    /// One bracketed member-kind list per live tile, in collection order.
    pub tiles: Vec<String>,
    pub total_cost: u32,
    pub instructions: Vec<String>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.expression)?;
        write!(f, "{}", self.tree)?;
        for tile in &self.tiles {
            writeln!(f, "{tile}")?;
        }
        writeln!(f, "Custo Total = {}", self.total_cost)?;
        for line in &self.instructions {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Runs the full pipeline on one line. Blank lines yield `None`.
pub fn analyze(line: &str, cache: &mut CostCache) -> SelectResult<Option<Report>> {
    let Some(tree) = ir::parse_line(line)? else {
        return Ok(None);
    };
    let tiling = tiler::tile_tree(&tree);
    let total_cost = cost::total_cost(&tree, &tiling, cache);
    let instructions = emit::emit(&tree, &tiling)?;

    let tiles: Vec<String> = tiling
        .roots(&tree)
        .into_iter()
        .map(|id| {
            let labels: Vec<&str> = tiling
                .tile(id)
                .members
                .iter()
                .map(|&node| tree.label(node))
                .collect();
            format!("[{}]", labels.join(", "))
        })
        .collect();

    log::debug!(
        "🧩 covered '{}' with {} tiles, cost {total_cost}",
        line.trim(),
        tiles.len()
    );

    Ok(Some(Report {
        expression: line.to_string(),
        tree: tree.render(),
        tiles,
        total_cost,
        instructions,
    }))
}

/// Processes a whole source, one expression per non-blank line, appending
/// each report to `out`. The first failing line aborts the remaining lines;
/// reports produced before the failure stay in `out`.
pub fn run_source(text: &str, cache: &mut CostCache, out: &mut String) -> SelectResult<()> {
    for line in text.lines() {
        if let Some(report) = analyze(line, cache)? {
            out.push_str(&report.to_string());
            out.push('\n');
        }
    }
    Ok(())
}
