use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::SpecError;

/// A named group of keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    keywords: Vec<String>,
}

impl Category {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Which keywords are counted, grouped by category.
///
/// Categories and the keywords inside them keep the order they were given in;
/// reports and fresh tallies follow that order. A keyword may appear in more
/// than one category and is then counted once per category.
///
/// # Examples
///
/// ```
/// use pdf_keyword_tally::KeywordSpec;
///
/// let spec = KeywordSpec::new([("Policy", ["tax", "Brexit"])])?;
/// assert_eq!(spec.len(), 2);
/// # Ok::<(), pdf_keyword_tally::SpecError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSpec {
    categories: Vec<Category>,
}

impl KeywordSpec {
    /// Build a spec from `(category, keywords)` pairs.
    ///
    /// Rejects empty keywords, empty or repeated category names, and a keyword
    /// listed twice within the same category.
    pub fn new<I, N, K, S>(categories: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = (N, K)>,
        N: Into<String>,
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen_categories = HashSet::new();
        let mut out = Vec::new();

        for (name, keywords) in categories {
            let name = name.into();
            if name.is_empty() {
                return Err(SpecError::EmptyCategory);
            }
            if !seen_categories.insert(name.clone()) {
                return Err(SpecError::DuplicateCategory(name));
            }

            let mut seen_keywords = HashSet::new();
            let mut list = Vec::new();
            for keyword in keywords {
                let keyword = keyword.into();
                if keyword.is_empty() {
                    return Err(SpecError::EmptyKeyword { category: name });
                }
                if !seen_keywords.insert(keyword.clone()) {
                    return Err(SpecError::DuplicateKeyword {
                        category: name,
                        keyword,
                    });
                }
                list.push(keyword);
            }

            out.push(Category {
                name,
                keywords: list,
            });
        }

        Ok(KeywordSpec { categories: out })
    }

    /// The keyword set used when no keyword file is given.
    pub fn default_spec() -> Self {
        KeywordSpec::new([
            (
                "Policy related",
                vec!["Brexit", "tariff", "regulation", "tax", "policy"],
            ),
            ("Uncertainty related", vec!["uncertainty", "risk", "volatility"]),
            (
                "Climate related",
                vec!["Warming", "carbon", "emissions", "climate"],
            ),
        ])
        .expect("built-in keyword spec is valid")
    }

    /// Parse a spec from TOML.
    ///
    /// ```toml
    /// [[category]]
    /// name = "Policy related"
    /// keywords = ["Brexit", "tax"]
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, SpecError> {
        let file: KeywordFile = toml::from_str(s)?;
        KeywordSpec::new(
            file.categories
                .into_iter()
                .map(|entry| (entry.name, entry.keywords)),
        )
    }

    /// Read and parse a TOML keyword file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, SpecError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Every `(category, keyword)` pair in spec order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories.iter().flat_map(|category| {
            category
                .keywords
                .iter()
                .map(move |keyword| (category.name.as_str(), keyword.as_str()))
        })
    }

    /// Number of `(category, keyword)` pairs.
    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.keywords.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeywordFile {
    #[serde(rename = "category", default)]
    categories: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CategoryEntry {
    name: String,
    #[serde(default)]
    keywords: Vec<String>,
}
