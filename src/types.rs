use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::spec::KeywordSpec;

/// Count for one keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

/// Counts for every keyword of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCounts {
    pub name: String,
    pub keywords: Vec<KeywordCount>,
}

impl CategoryCounts {
    fn entry_mut(&mut self, keyword: &str) -> &mut u64 {
        let idx = match self.keywords.iter().position(|k| k.keyword == keyword) {
            Some(idx) => idx,
            None => {
                self.keywords.push(KeywordCount {
                    keyword: keyword.to_owned(),
                    count: 0,
                });
                self.keywords.len() - 1
            }
        };
        &mut self.keywords[idx].count
    }
}

/// Ordered `category -> keyword -> count` table.
///
/// Used both for the tally of a single run and for the cumulative state. It
/// serializes as the nested JSON object `{category: {keyword: count}}` in its
/// own order, and deserializes from any such object.
///
/// Equality compares the counts only, not the order entries are listed in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "BTreeMap<String, BTreeMap<String, u64>>")]
pub struct KeywordCounts {
    categories: Vec<CategoryCounts>,
}

/// Keyword counts for a single document.
pub type RunTally = KeywordCounts;

/// Keyword counts accumulated across every run.
pub type CumulativeState = KeywordCounts;

impl KeywordCounts {
    /// A table with every pair of `spec` at zero, in spec order.
    pub fn zeroed(spec: &KeywordSpec) -> Self {
        let categories = spec
            .categories()
            .iter()
            .map(|category| CategoryCounts {
                name: category.name().to_owned(),
                keywords: category
                    .keywords()
                    .iter()
                    .map(|keyword| KeywordCount {
                        keyword: keyword.clone(),
                        count: 0,
                    })
                    .collect(),
            })
            .collect();
        KeywordCounts { categories }
    }

    pub fn categories(&self) -> &[CategoryCounts] {
        &self.categories
    }

    pub fn get(&self, category: &str, keyword: &str) -> Option<u64> {
        self.categories
            .iter()
            .find(|c| c.name == category)?
            .keywords
            .iter()
            .find(|k| k.keyword == keyword)
            .map(|k| k.count)
    }

    /// Mutable count for a pair, inserting it at zero (at the end of its
    /// category, or in a new trailing category) if absent.
    pub fn entry_mut(&mut self, category: &str, keyword: &str) -> &mut u64 {
        let idx = match self.categories.iter().position(|c| c.name == category) {
            Some(idx) => idx,
            None => {
                self.categories.push(CategoryCounts {
                    name: category.to_owned(),
                    keywords: Vec::new(),
                });
                self.categories.len() - 1
            }
        };
        self.categories[idx].entry_mut(keyword)
    }

    /// Every `(category, keyword, count)` triple in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.categories.iter().flat_map(|category| {
            category
                .keywords
                .iter()
                .map(move |k| (category.name.as_str(), k.keyword.as_str(), k.count))
        })
    }

    pub fn total(&self) -> u64 {
        self.iter().fold(0u64, |acc, (_, _, n)| acc.saturating_add(n))
    }

    /// Reorder to match `spec`, adding its missing pairs at zero.
    ///
    /// Pairs the spec does not mention are kept: categories unknown to the
    /// spec go after the spec's categories, and unknown keywords go after the
    /// spec's keywords in their category, both sorted by name.
    pub fn conform_to(self, spec: &KeywordSpec) -> Self {
        let mut remaining = self.categories;
        let mut out = Vec::with_capacity(spec.categories().len());

        for category in spec.categories() {
            let mut existing = match remaining.iter().position(|c| c.name == category.name()) {
                Some(idx) => remaining.remove(idx).keywords,
                None => Vec::new(),
            };

            let mut keywords: Vec<KeywordCount> = category
                .keywords()
                .iter()
                .map(|keyword| {
                    let count = match existing.iter().position(|k| &k.keyword == keyword) {
                        Some(idx) => existing.remove(idx).count,
                        None => 0,
                    };
                    KeywordCount {
                        keyword: keyword.clone(),
                        count,
                    }
                })
                .collect();

            existing.sort_by(|a, b| a.keyword.cmp(&b.keyword));
            keywords.extend(existing);

            out.push(CategoryCounts {
                name: category.name().to_owned(),
                keywords,
            });
        }

        remaining.sort_by(|a, b| a.name.cmp(&b.name));
        for mut category in remaining {
            category.keywords.sort_by(|a, b| a.keyword.cmp(&b.keyword));
            out.push(category);
        }

        KeywordCounts { categories: out }
    }
}

impl KeywordCounts {
    fn as_map(&self) -> BTreeMap<&str, BTreeMap<&str, u64>> {
        self.categories
            .iter()
            .map(|category| {
                let keywords: BTreeMap<&str, u64> = category
                    .keywords
                    .iter()
                    .map(|k| (k.keyword.as_str(), k.count))
                    .collect();
                (category.name.as_str(), keywords)
            })
            .collect()
    }
}

impl PartialEq for KeywordCounts {
    fn eq(&self, other: &Self) -> bool {
        self.as_map() == other.as_map()
    }
}

impl Eq for KeywordCounts {}

impl From<BTreeMap<String, BTreeMap<String, u64>>> for KeywordCounts {
    fn from(map: BTreeMap<String, BTreeMap<String, u64>>) -> Self {
        let categories = map
            .into_iter()
            .map(|(name, keywords)| CategoryCounts {
                name,
                keywords: keywords
                    .into_iter()
                    .map(|(keyword, count)| KeywordCount { keyword, count })
                    .collect(),
            })
            .collect();
        KeywordCounts { categories }
    }
}

struct CategoryMap<'a>(&'a [KeywordCount]);

impl Serialize for CategoryMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for k in self.0 {
            map.serialize_entry(&k.keyword, &k.count)?;
        }
        map.end()
    }
}

impl Serialize for KeywordCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.name, &CategoryMap(&category.keywords))?;
        }
        map.end()
    }
}

/// Keyword counts of a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageTally {
    /// 1-based page number.
    pub page_number: u32,
    pub counts: RunTally,
}
