use std::f64::consts::PI;
use std::fmt;
use std::path::PathBuf;

use quick_xml::escape::escape;
use tracing::{info, warn};

use crate::error::Error;
use crate::types::KeywordCounts;

/// Where a chart goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartTarget {
    /// Write an SVG pie chart to this file.
    Svg(PathBuf),
    /// Build a horizontal bar chart for a terminal.
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Every count is zero, so there are no shares to draw.
    ZeroTotal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartOutcome {
    Svg(PathBuf),
    Terminal(String),
    /// Nothing was drawn. A warning, not an error.
    Skipped(SkipReason),
}

/// One `(category, keyword)` pair's share of the grand total.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub category: String,
    pub keyword: String,
    pub count: u64,
    pub share: f64,
}

impl Slice {
    pub fn label(&self) -> String {
        format!("{} / {}", self.category, self.keyword)
    }
}

/// Shares of every non-zero pair, in table order. Empty when the total is zero.
pub fn slices(counts: &KeywordCounts) -> Vec<Slice> {
    let total = counts.total();
    if total == 0 {
        return Vec::new();
    }
    counts
        .iter()
        .filter(|(_, _, n)| *n > 0)
        .map(|(category, keyword, count)| Slice {
            category: category.to_owned(),
            keyword: keyword.to_owned(),
            count,
            share: count as f64 / total as f64,
        })
        .collect()
}

/// Draw `counts` to `target`. Pairs with a zero count are left out.
pub fn render_chart(counts: &KeywordCounts, target: &ChartTarget) -> Result<ChartOutcome, Error> {
    let slices = slices(counts);
    if slices.is_empty() {
        warn!("all keyword counts are zero, skipping chart");
        return Ok(ChartOutcome::Skipped(SkipReason::ZeroTotal));
    }

    match target {
        ChartTarget::Svg(path) => {
            let svg = svg_pie(&slices);
            std::fs::write(path, svg).map_err(|source| Error::Chart {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), slices = slices.len(), "wrote chart");
            Ok(ChartOutcome::Svg(path.clone()))
        }
        ChartTarget::Terminal => Ok(ChartOutcome::Terminal(terminal_bars(&slices))),
    }
}

const PALETTE: [&str; 10] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

const RADIUS: f64 = 160.0;
const CENTER: (f64, f64) = (200.0, 200.0);
const LEGEND_X: f64 = 400.0;
const LEGEND_ROW: f64 = 22.0;

// Angle 0 is twelve o'clock, increasing clockwise.
fn point_at(angle: f64) -> (f64, f64) {
    (
        CENTER.0 + RADIUS * angle.sin(),
        CENTER.1 - RADIUS * angle.cos(),
    )
}

/// SVG pie chart with a legend to its right.
pub fn svg_pie(slices: &[Slice]) -> String {
    SvgPie(slices).to_string()
}

struct SvgPie<'a>(&'a [Slice]);

impl SvgPie<'_> {
    fn wedges(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut start = 0.0;
        for (idx, slice) in self.0.iter().enumerate() {
            let color = PALETTE[idx % PALETTE.len()];
            let label = slice.label();
            let title = escape(&label);

            if slice.share >= 1.0 {
                writeln!(
                    f,
                    r#"  <circle cx="{}" cy="{}" r="{}" fill="{color}"><title>{title}</title></circle>"#,
                    CENTER.0, CENTER.1, RADIUS
                )?;
                continue;
            }

            let end = start + slice.share * 2.0 * PI;
            let (x0, y0) = point_at(start);
            let (x1, y1) = point_at(end);
            let large_arc = if end - start > PI { 1 } else { 0 };
            writeln!(
                f,
                r#"  <path d="M {:.2} {:.2} L {x0:.2} {y0:.2} A {RADIUS} {RADIUS} 0 {large_arc} 1 {x1:.2} {y1:.2} Z" fill="{color}" stroke="white"><title>{title}</title></path>"#,
                CENTER.0, CENTER.1
            )?;
            start = end;
        }
        Ok(())
    }

    fn legend(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, slice) in self.0.iter().enumerate() {
            let color = PALETTE[idx % PALETTE.len()];
            let y = 30.0 + LEGEND_ROW * idx as f64;
            let label = slice.label();
            writeln!(
                f,
                r#"  <rect x="{LEGEND_X}" y="{:.0}" width="14" height="14" fill="{color}"/>"#,
                y - 12.0
            )?;
            writeln!(
                f,
                r#"  <text x="{:.0}" y="{y:.0}" font-family="sans-serif" font-size="13">{}: {} ({:.1}%)</text>"#,
                LEGEND_X + 22.0,
                escape(&label),
                slice.count,
                slice.share * 100.0
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for SvgPie<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let legend_height = 40.0 + LEGEND_ROW * self.0.len() as f64;
        let height = legend_height.max(2.0 * CENTER.1);
        let width = LEGEND_X + 360.0;

        writeln!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        )?;
        self.wedges(f)?;
        self.legend(f)?;
        writeln!(f, "</svg>")
    }
}

const BAR_WIDTH: usize = 40;

/// Horizontal bar chart scaled so the largest slice fills the bar width.
pub fn terminal_bars(slices: &[Slice]) -> String {
    TerminalBars(slices).to_string()
}

struct TerminalBars<'a>(&'a [Slice]);

impl fmt::Display for TerminalBars<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self
            .0
            .iter()
            .map(|s| s.label().chars().count())
            .max()
            .unwrap_or(0);
        let max_share = self.0.iter().map(|s| s.share).fold(0.0, f64::max);

        for slice in self.0 {
            let filled = if max_share > 0.0 {
                ((slice.share / max_share) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            // Non-zero slices always get at least one cell.
            let filled = filled.clamp(1, BAR_WIDTH);
            writeln!(
                f,
                "{:<label_width$} │{}{}│ {} ({:.1}%)",
                slice.label(),
                "█".repeat(filled),
                " ".repeat(BAR_WIDTH - filled),
                slice.count,
                slice.share * 100.0
            )?;
        }
        Ok(())
    }
}
