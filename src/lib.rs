//! PDF keyword tally library
//!
//! Extracts page text from PDF files, counts predefined keywords grouped by
//! category, and accumulates those counts in a JSON state file across runs.

mod chart;
mod counter;
mod error;
mod extract;
mod output;
mod pipeline;
mod spec;
mod store;
mod types;

// Re-export error types
pub use error::{Error, ExtractError, SpecError, StateError};

// Re-export extraction API
pub use extract::{
    PageTextSource, PdfExtractor, PdfExtractorBuilder, StaticPages, pages_from_bytes,
    pages_from_path, pages_from_reader,
};

// Re-export counting, accumulation and reporting
pub use chart::{ChartOutcome, ChartTarget, SkipReason, Slice, render_chart, slices};
pub use counter::{count, count_pages, sum_pages};
pub use output::{render_page_report, render_text};
pub use pipeline::{Pipeline, RunConfig, RunOutcome, RunReport};
pub use spec::{Category, KeywordSpec};
pub use store::{CumulativeStore, StateLock, merge};

// Re-export public types
pub use types::{
    CategoryCounts, CumulativeState, KeywordCount, KeywordCounts, PageTally, RunTally,
};
