use tracing::debug;

use crate::spec::KeywordSpec;
use crate::types::{PageTally, RunTally};

// Literal, case-sensitive, non-overlapping: "aaa" holds one "aa".
fn occurrences(text: &str, keyword: &str) -> u64 {
    text.matches(keyword).count() as u64
}

/// Count every keyword of `spec` on each page separately.
///
/// Page numbers are 1-based and follow the order of `pages`.
pub fn count_pages<S: AsRef<str>>(pages: &[S], spec: &KeywordSpec) -> Vec<PageTally> {
    pages
        .iter()
        .enumerate()
        .map(|(idx, page)| {
            let text = page.as_ref();
            let mut counts = RunTally::zeroed(spec);
            for (category, keyword) in spec.pairs() {
                let n = occurrences(text, keyword);
                if n > 0 {
                    *counts.entry_mut(category, keyword) += n;
                }
            }
            let page_number = idx as u32 + 1;
            debug!(page_number, total = counts.total(), "counted page");
            PageTally {
                page_number,
                counts,
            }
        })
        .collect()
}

/// Sum a per-page breakdown into the tally of the whole document.
pub fn sum_pages(pages: &[PageTally], spec: &KeywordSpec) -> RunTally {
    let mut tally = RunTally::zeroed(spec);
    for page in pages {
        for (category, keyword, n) in page.counts.iter() {
            let entry = tally.entry_mut(category, keyword);
            *entry = entry.saturating_add(n);
        }
    }
    tally
}

/// Count every keyword of `spec` across all `pages`.
///
/// The result holds every `(category, keyword)` pair of `spec`, zero when the
/// keyword never occurs or `pages` is empty.
///
/// # Examples
///
/// ```
/// use pdf_keyword_tally::{KeywordSpec, count};
///
/// let spec = KeywordSpec::new([("Policy", ["tax"])])?;
/// let tally = count(&["tax tax", "no match"], &spec);
/// assert_eq!(tally.get("Policy", "tax"), Some(2));
/// # Ok::<(), pdf_keyword_tally::SpecError>(())
/// ```
pub fn count<S: AsRef<str>>(pages: &[S], spec: &KeywordSpec) -> RunTally {
    sum_pages(&count_pages(pages, spec), spec)
}
