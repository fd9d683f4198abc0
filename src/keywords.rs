// src/keywords.rs
//! Phrase matching primitives shared by the relevance filter, scorer and categorizer.
//!
//! Phrases are compiled into case-insensitive regexes with word boundaries on the
//! edges that start/end with a word character, so `ski` does not match `skip`
//! while `st. moritz` or `$40m` still work.

use regex::Regex;

/// Build the regex source for one literal phrase.
fn phrase_pattern(phrase: &str) -> String {
    let p = phrase.trim().to_lowercase();
    let escaped = regex::escape(&p);
    let lead = p.chars().next().is_some_and(|c| c.is_alphanumeric());
    let tail = p.chars().last().is_some_and(|c| c.is_alphanumeric());
    format!(
        "{}{}{}",
        if lead { r"\b" } else { "" },
        escaped,
        if tail { r"\b" } else { "" }
    )
}

/// One compiled phrase.
#[derive(Debug, Clone)]
pub struct Phrase {
    pub text: String,
    re: Regex,
}

impl Phrase {
    pub fn new(text: &str) -> anyhow::Result<Self> {
        let re = Regex::new(&format!("(?iu){}", phrase_pattern(text)))
            .map_err(|e| anyhow::anyhow!("phrase `{}` regex error: {}", text, e))?;
        Ok(Self {
            text: text.trim().to_lowercase(),
            re,
        })
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.re.is_match(haystack)
    }

    /// Number of non-overlapping occurrences.
    pub fn count(&self, haystack: &str) -> usize {
        self.re.find_iter(haystack).count()
    }
}

/// An ordered set of phrases. Declaration order is kept for stable reporting.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    phrases: Vec<Phrase>,
    any: Option<Regex>,
}

impl KeywordSet {
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> anyhow::Result<Self> {
        let mut compiled: Vec<Phrase> = Vec::with_capacity(phrases.len());
        for p in phrases {
            let p = p.as_ref();
            if p.trim().is_empty() || compiled.iter().any(|c| c.text == p.trim().to_lowercase()) {
                continue;
            }
            compiled.push(Phrase::new(p)?);
        }
        let any = if compiled.is_empty() {
            None
        } else {
            let alt = compiled
                .iter()
                .map(|p| phrase_pattern(&p.text))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                Regex::new(&format!("(?iu)(?:{alt})"))
                    .map_err(|e| anyhow::anyhow!("keyword set regex error: {}", e))?,
            )
        };
        Ok(Self {
            phrases: compiled,
            any,
        })
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }

    /// True if any phrase occurs in `haystack`.
    pub fn matches_any(&self, haystack: &str) -> bool {
        self.any.as_ref().is_some_and(|re| re.is_match(haystack))
    }

    /// Phrases that occur in `haystack`, in declaration order.
    pub fn matched<'a>(&'a self, haystack: &str) -> Vec<&'a str> {
        if !self.matches_any(haystack) {
            return Vec::new();
        }
        self.phrases
            .iter()
            .filter(|p| p.is_match(haystack))
            .map(|p| p.text.as_str())
            .collect()
    }

    /// Sum of occurrences of all phrases.
    pub fn count_all(&self, haystack: &str) -> usize {
        if !self.matches_any(haystack) {
            return 0;
        }
        self.phrases.iter().map(|p| p.count(haystack)).sum()
    }
}

/// A regex pattern set (penalties). Patterns are used verbatim, case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> anyhow::Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(&format!("(?iu){p}"))
                    .map_err(|e| anyhow::anyhow!("pattern `{}` regex error: {}", p, e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches_any(&self, haystack: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(haystack))
    }
}
