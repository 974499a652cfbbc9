use std::io::{ErrorKind, Read};
use std::path::Path;

use lopdf::Document;
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

use crate::error::ExtractError;

/// Anything that can turn a document path into one text string per page.
///
/// The pipeline only talks to extraction through this trait, so counting and
/// accumulation can be driven without a PDF on disk.
pub trait PageTextSource {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError>;
}

/// Builder for configuring PDF extraction options.
///
/// # Examples
///
/// ```no_run
/// use pdf_keyword_tally::PdfExtractor;
///
/// // Only the first two pages of an encrypted file
/// let pages = PdfExtractor::builder()
///     .password("secret")
///     .max_pages(2)
///     .build()
///     .pages_from_path("encrypted.pdf")?;
/// # Ok::<(), pdf_keyword_tally::ExtractError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PdfExtractorBuilder {
    password: Option<String>,
    max_pages: Option<usize>,
    normalize: bool,
}

impl Default for PdfExtractorBuilder {
    fn default() -> Self {
        PdfExtractorBuilder {
            password: None,
            max_pages: None,
            normalize: true,
        }
    }
}

impl PdfExtractorBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the password for encrypted PDFs.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Only extract the first `n` pages.
    pub fn max_pages(mut self, n: usize) -> Self {
        self.max_pages = Some(n);
        self
    }

    /// Apply NFKC normalization to page text (on by default), so that
    /// ligatures like "ﬁ" read as "fi".
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Build the extractor configuration.
    pub fn build(self) -> PdfExtractor {
        PdfExtractor {
            password: self.password,
            max_pages: self.max_pages,
            normalize: self.normalize,
        }
    }
}

/// PDF page-text extractor with configuration options.
///
/// # Examples
///
/// ```no_run
/// use pdf_keyword_tally::PdfExtractor;
///
/// let pages = PdfExtractor::default().pages_from_path("file.pdf")?;
/// for (idx, text) in pages.iter().enumerate() {
///     println!("page {}: {} chars", idx + 1, text.len());
/// }
/// # Ok::<(), pdf_keyword_tally::ExtractError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    password: Option<String>,
    max_pages: Option<usize>,
    normalize: bool,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        PdfExtractorBuilder::default().build()
    }
}

impl PdfExtractor {
    /// Create a builder for configuring extraction options.
    pub fn builder() -> PdfExtractorBuilder {
        PdfExtractorBuilder::new()
    }

    /// Extract the text of each page of the PDF at `path`.
    pub fn pages_from_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<String>, ExtractError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ExtractError::DocumentNotFound {
                path: path.to_path_buf(),
            },
            _ => ExtractError::unreadable(path, e),
        })?;
        info!(path = %path.display(), bytes = bytes.len(), "loaded document");
        self.extract(&bytes, path)
    }

    /// Extract the text of each page of a PDF in memory.
    pub fn pages_from_bytes(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        self.extract(bytes, Path::new("<memory>"))
    }

    /// Extract the text of each page of a PDF reader.
    pub fn pages_from_reader<R: Read>(&self, mut reader: R) -> Result<Vec<String>, ExtractError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ExtractError::unreadable("<reader>", e))?;
        self.extract(&bytes, Path::new("<reader>"))
    }

    fn normalize_text(&self, text: String) -> String {
        if self.normalize {
            text.nfkc().collect()
        } else {
            text
        }
    }

    fn extract(&self, bytes: &[u8], origin: &Path) -> Result<Vec<String>, ExtractError> {
        let mut doc =
            Document::load_mem(bytes).map_err(|e| ExtractError::unreadable(origin, e))?;

        if doc.is_encrypted() {
            let password = self.password.as_deref().unwrap_or("");
            doc.decrypt(password)
                .map_err(|e| ExtractError::unreadable(origin, format!("decryption failed: {e}")))?;
        }

        let page_numbers: Vec<u32> = doc
            .get_pages()
            .into_keys()
            .take(self.max_pages.unwrap_or(usize::MAX))
            .collect();

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page in page_numbers {
            let text = doc
                .extract_text(&[page])
                .map_err(|e| ExtractError::ExtractionFailure {
                    page,
                    reason: e.to_string(),
                })?;
            let text = self.normalize_text(text);
            debug!(page, chars = text.chars().count(), "extracted page text");
            pages.push(text);
        }

        Ok(pages)
    }
}

impl PageTextSource for PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        self.pages_from_path(path)
    }
}

/// Extract the text of each page of the PDF at `path` using default settings.
///
/// This is a convenience function equivalent to `PdfExtractor::default().pages_from_path(path)`.
pub fn pages_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ExtractError> {
    PdfExtractor::default().pages_from_path(path)
}

/// Extract the text of each page of a PDF in memory using default settings.
pub fn pages_from_bytes(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    PdfExtractor::default().pages_from_bytes(bytes)
}

/// Extract the text of each page of a PDF reader using default settings.
pub fn pages_from_reader<R: Read>(reader: R) -> Result<Vec<String>, ExtractError> {
    PdfExtractor::default().pages_from_reader(reader)
}

/// Pages supplied up front, ignoring the requested path.
///
/// Handy when text comes from somewhere other than a PDF (or in tests).
#[derive(Debug, Clone, Default)]
pub struct StaticPages {
    pages: Vec<String>,
}

impl StaticPages {
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StaticPages {
            pages: pages.into_iter().map(Into::into).collect(),
        }
    }
}

impl PageTextSource for StaticPages {
    fn extract_pages(&self, _path: &Path) -> Result<Vec<String>, ExtractError> {
        Ok(self.pages.clone())
    }
}

impl From<Vec<String>> for StaticPages {
    fn from(pages: Vec<String>) -> Self {
        StaticPages { pages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::count;
    use crate::spec::KeywordSpec;

    #[test]
    fn ligatures_are_expanded_by_default() {
        let extractor = PdfExtractor::default();
        assert_eq!(extractor.normalize_text("\u{FB01}nance".to_string()), "finance");
        assert_eq!(extractor.normalize_text("e\u{FB00}ort".to_string()), "effort");
    }

    #[test]
    fn normalization_can_be_turned_off() {
        let extractor = PdfExtractor::builder().normalize(false).build();
        let raw = "\u{FB01}nance".to_string();
        assert_eq!(extractor.normalize_text(raw.clone()), raw);
    }

    #[test]
    fn ligature_text_counts_only_when_normalized() {
        let spec = KeywordSpec::new([("Policy", vec!["finance"])]).unwrap();
        let page = "public \u{FB01}nance and \u{FB01}nance reform".to_string();

        let on = PdfExtractor::default().normalize_text(page.clone());
        let off = PdfExtractor::builder().normalize(false).build().normalize_text(page);
        assert_eq!(count(&[on], &spec).get("Policy", "finance"), Some(2));
        assert_eq!(count(&[off], &spec).get("Policy", "finance"), Some(0));
    }
}
