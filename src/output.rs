use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::types::{KeywordCounts, PageTally, RunTally};

/// Plain-text listing, one category per block, keywords in an aligned column.
///
/// ```text
/// Policy related:
///   Brexit: 12
///   tax:    3
/// Total: 15
/// ```
impl fmt::Display for KeywordCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .iter()
            .map(|(_, keyword, _)| keyword.chars().count())
            .max()
            .unwrap_or(0);

        for category in self.categories() {
            writeln!(f, "{}:", category.name)?;
            for k in &category.keywords {
                let pad = width - k.keyword.chars().count();
                writeln!(f, "  {}:{} {}", k.keyword, " ".repeat(pad), k.count)?;
            }
        }
        writeln!(f, "Total: {}", self.total())
    }
}

pub fn render_text(counts: &KeywordCounts) -> String {
    counts.to_string()
}

#[derive(Serialize)]
struct PageRecord<'a> {
    page_number: u32,
    counts: &'a RunTally,
    #[serde(skip_serializing_if = "Option::is_none")]
    extracted_text: Option<&'a str>,
}

/// Render the per-page breakdown as a pretty JSON array.
///
/// When `texts` is given, each record also carries the text extracted from
/// that page (matched by position).
pub fn render_page_report(
    pages: &[PageTally],
    texts: Option<&[String]>,
) -> Result<String, Error> {
    let records: Vec<PageRecord> = pages
        .iter()
        .enumerate()
        .map(|(idx, page)| PageRecord {
            page_number: page.page_number,
            counts: &page.counts,
            extracted_text: texts.and_then(|t| t.get(idx)).map(String::as_str),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
