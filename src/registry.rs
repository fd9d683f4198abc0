//! # Source Registry
//!
//! Static list of feed descriptors (name, endpoint, category tag, trust boost).
//!
//! - Loads from the `[[sources]]` array of the curation TOML or uses `default_seed()`.
//! - Names are the unique key; duplicates keep the first declaration.
//! - Lookup is case-insensitive with normalization of punctuation and dashes.
//! - Trust boost is clamped to `[0, MAX_TRUST_BOOST]`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MAX_TRUST_BOOST: i32 = 5;

/// One configured feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub boost: i32,
}

#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
    by_key: HashMap<String, usize>,
}

impl SourceRegistry {
    pub fn new(descriptors: Vec<SourceDescriptor>) -> Self {
        let mut sources = Vec::with_capacity(descriptors.len());
        let mut by_key = HashMap::new();
        for mut d in descriptors {
            let key = normalize(&d.name);
            if key.is_empty() || by_key.contains_key(&key) {
                continue;
            }
            d.boost = d.boost.clamp(0, MAX_TRUST_BOOST);
            by_key.insert(key, sources.len());
            sources.push(d);
        }
        Self { sources, by_key }
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub fn get(&self, name: &str) -> Option<&SourceDescriptor> {
        self.by_key.get(&normalize(name)).map(|&i| &self.sources[i])
    }

    /// Trust boost for `name`; unknown sources get 0.
    pub fn boost_for(&self, name: &str) -> i32 {
        self.get(name).map(|d| d.boost).unwrap_or(0)
    }

    /// Built-in seed with the curated ski-industry feeds.
    pub fn default_seed() -> Self {
        let gn = |q: &str| format!("https://news.google.com/rss/search?q={q}&hl=en-US&gl=US&ceid=US:en");
        let seed: Vec<(&str, String, &str, i32)> = vec![
            ("New York Times - Travel", "https://rss.nytimes.com/services/xml/rss/nyt/Travel.xml".into(), "major_publication", 3),
            ("Washington Post", "https://feeds.washingtonpost.com/rss/business".into(), "major_publication", 3),
            ("Financial Times", "https://www.ft.com/rss/home".into(), "major_publication", 3),
            ("Bloomberg Markets", "https://feeds.bloomberg.com/markets/news.rss".into(), "major_publication", 3),
            ("Google News - Ski Industry", gn("ski+resort+business+OR+ski+industry"), "aggregator", 1),
            ("Google News - Vail Alterra Ski", gn("Vail+Resorts+OR+Alterra+Mountain+ski"), "aggregator", 2),
            ("Google News - Ski Pass Prices", gn("ski+pass+price+OR+Epic+Pass+OR+Ikon+Pass"), "aggregator", 1),
            ("Globe and Mail - Business", "https://www.theglobeandmail.com/arc/outboundfeeds/rss/category/business/".into(), "canadian_publication", 3),
            ("CBC News - Business", "https://www.cbc.ca/webfeed/rss/rss-business".into(), "canadian_publication", 2),
            ("Outside Business Journal", "https://www.outsidebusinessjournal.com/feed/".into(), "business", 2),
            ("Snow Industry News", "https://www.snowindustrynews.com/rss".into(), "industry", 2),
            ("Ski Area Management", "https://www.saminfo.com/headline-news?format=feed&type=rss".into(), "industry", 2),
            ("Unofficial Networks", "https://unofficialnetworks.com/feed/".into(), "news", 2),
            ("SnowBrains", "https://snowbrains.com/feed/".into(), "news", 2),
            ("PlanetSKI", "https://planetski.eu/feed/".into(), "international", 1),
            ("Summit Daily News", "https://www.summitdaily.com/feed/".into(), "local", 1),
            ("Vail Daily", "https://www.vaildaily.com/feed/".into(), "local", 1),
            ("Aspen Times", "https://www.aspentimes.com/feed/".into(), "local", 1),
            ("Park Record", "https://www.parkrecord.com/feed/".into(), "local", 1),
            ("Tahoe Daily Tribune", "https://www.tahoedailytribune.com/feed/".into(), "local", 1),
            ("High Country News", "https://www.hcn.org/feed/".into(), "environment", 1),
            ("International Skiing History Association", "https://www.skiinghistory.org/feed".into(), "history", 1),
            ("BIV - Tourism", "https://biv.com/topic/tourism/feed".into(), "canadian", 2),
            ("Vail Resorts Investor Relations", "https://investors.vailresorts.com/rss/news-releases.xml".into(), "financial", 5),
        ];

        Self::new(
            seed.into_iter()
                .map(|(name, endpoint, category, boost)| SourceDescriptor {
                    name: name.to_string(),
                    endpoint,
                    category: category.to_string(),
                    boost,
                })
                .collect(),
        )
    }
}

/// Normalize input string: lowercase, replace punctuation/dashes with spaces,
/// collapse multiple spaces into one.
pub(crate) fn normalize(s: &str) -> String {
    let mut out = s.trim().to_lowercase();

    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }
    out = out.replace(['\n', '\r', '\t', '.', ',', '’', '\''], " ");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
