// src/categorize.rs
//! Categorizer: one primary + up to three secondary categories from weighted
//! keyword tallies (title match = 3, elsewhere = 1, every occurrence counts).
//! Ties keep declaration order.

use crate::keywords::KeywordSet;
use crate::lexicon::Lexicon;
use crate::model::RawItem;

pub const TITLE_WEIGHT: usize = 3;
pub const BODY_WEIGHT: usize = 1;
pub const MAX_SECONDARY: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categorization {
    pub primary: String,
    pub secondary: Vec<String>,
    /// `(category id, tally)` for every category, sorted as ranked.
    pub tallies: Vec<(String, usize)>,
}

impl Categorization {
    fn tally_of(&self, id: &str) -> usize {
        self.tallies
            .iter()
            .find(|(c, _)| c == id)
            .map(|(_, t)| *t)
            .unwrap_or(0)
    }

    /// Promote an externally suggested category when its tally is non-zero and
    /// at least half the primary's. The old primary becomes the first secondary.
    pub fn promote(&mut self, suggested: &str) {
        if suggested == self.primary {
            return;
        }
        let suggested_tally = self.tally_of(suggested);
        let primary_tally = self.tally_of(&self.primary);
        if suggested_tally == 0 || suggested_tally * 2 < primary_tally {
            return;
        }
        let old = std::mem::replace(&mut self.primary, suggested.to_string());
        self.secondary.retain(|c| c != suggested && c != &old);
        self.secondary.insert(0, old);
        self.secondary.truncate(MAX_SECONDARY);
    }
}

#[derive(Debug, Clone)]
struct Category {
    id: String,
    keywords: KeywordSet,
}

#[derive(Debug, Clone)]
pub struct Categorizer {
    categories: Vec<Category>,
    default_category: String,
}

impl Categorizer {
    pub fn from_lexicon(lexicon: &Lexicon) -> anyhow::Result<Self> {
        let categories = lexicon
            .categories
            .iter()
            .map(|c| {
                Ok(Category {
                    id: c.id.clone(),
                    keywords: KeywordSet::new(&c.keywords)?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            categories,
            default_category: lexicon.default_category.clone(),
        })
    }

    pub fn categorize(&self, item: &RawItem) -> Categorization {
        let title = item.title_lc();
        let rest = item.rest_lc();

        let mut tallies: Vec<(String, usize)> = self
            .categories
            .iter()
            .map(|c| {
                let t = c.keywords.count_all(&title) * TITLE_WEIGHT
                    + c.keywords.count_all(&rest) * BODY_WEIGHT;
                (c.id.clone(), t)
            })
            .collect();
        // stable: equal tallies keep declaration order
        tallies.sort_by(|a, b| b.1.cmp(&a.1));

        let mut nonzero = tallies.iter().filter(|(_, t)| *t > 0).map(|(id, _)| id.clone());
        let primary = nonzero
            .next()
            .unwrap_or_else(|| self.default_category.clone());
        let secondary = nonzero
            .filter(|id| *id != primary)
            .take(MAX_SECONDARY)
            .collect();

        Categorization {
            primary,
            secondary,
            tallies,
        }
    }
}
