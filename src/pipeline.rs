use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::counter::{count_pages, sum_pages};
use crate::error::{Error, ExtractError};
use crate::extract::PageTextSource;
use crate::output::render_text;
use crate::spec::KeywordSpec;
use crate::store::{CumulativeStore, merge};
use crate::types::{CumulativeState, PageTally, RunTally};

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    spec: KeywordSpec,
    state_path: PathBuf,
}

impl RunConfig {
    pub fn new(spec: KeywordSpec, state_path: impl Into<PathBuf>) -> Self {
        RunConfig {
            spec,
            state_path: state_path.into(),
        }
    }

    /// Read the keywords from a TOML file, or use the built-in set when
    /// `keywords` is `None`.
    pub fn from_keyword_file(
        keywords: Option<&Path>,
        state_path: impl Into<PathBuf>,
    ) -> Result<Self, Error> {
        let spec = match keywords {
            Some(path) => KeywordSpec::from_toml_file(path)?,
            None => KeywordSpec::default_spec(),
        };
        Ok(RunConfig::new(spec, state_path))
    }
}

/// Result of a run that reached the cumulative state.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub document: PathBuf,
    /// Extracted text, one entry per page.
    pub texts: Vec<String>,
    pub pages: Vec<PageTally>,
    pub tally: RunTally,
    /// State after this run's tally was merged and persisted.
    pub state: CumulativeState,
    /// `render_text` of `state`.
    pub summary: String,
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunReport),
    /// The document could not be read. The state file was not touched.
    ExtractionFailed(ExtractError),
}

/// Extract, count, accumulate.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: RunConfig,
}

impl Pipeline {
    pub fn new(config: RunConfig) -> Self {
        Pipeline { config }
    }

    /// Run once over `document`.
    ///
    /// Extraction failures come back as [`RunOutcome::ExtractionFailed`]
    /// before the state is locked, read or written. State errors, corruption
    /// included, are returned as `Err`. Load, merge and persist happen under
    /// the state lock, so concurrent runs on one state file all count.
    pub fn run<S>(&self, document: &Path, source: &S) -> Result<RunOutcome, Error>
    where
        S: PageTextSource + ?Sized,
    {
        let texts = match source.extract_pages(document) {
            Ok(texts) => texts,
            Err(e) => {
                warn!(document = %document.display(), error = %e, "extraction failed, state left untouched");
                return Ok(RunOutcome::ExtractionFailed(e));
            }
        };

        let spec = &self.config.spec;
        let pages = count_pages(&texts, spec);
        let tally = sum_pages(&pages, spec);
        info!(
            document = %document.display(),
            pages = pages.len(),
            total = tally.total(),
            "counted keywords"
        );

        let store = CumulativeStore::new(&self.config.state_path);
        let _lock = store.lock()?;
        let state = store.load(spec)?;
        let state = merge(state, &tally);
        store.persist(&state)?;

        let summary = render_text(&state);
        Ok(RunOutcome::Completed(RunReport {
            document: document.to_path_buf(),
            texts,
            pages,
            tally,
            state,
            summary,
        }))
    }
}
