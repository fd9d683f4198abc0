//! # Lexicon
//!
//! Keyword configuration for the ski-industry domain:
//!
//! - core-topic terms (presence alone establishes relevance),
//! - macro terms + geography terms (relevant only together),
//! - booster categories (title / body points),
//! - penalty categories (regex patterns with `unless` exceptions),
//! - category definitions for the categorizer.
//!
//! Ships a built-in seed (`Lexicon::default()`); any list can be replaced from
//! the `[lexicon]` table of the curation TOML. Missing keys keep the seed.

use serde::{Deserialize, Serialize};

/// Score added when a booster keyword appears in the title / only in the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterCfg {
    pub id: String,
    pub title_points: i32,
    pub body_points: i32,
    pub keywords: Vec<String>,
}

/// Fixed penalty applied once per matched category, wherever it matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyCfg {
    pub id: String,
    /// Positive number; subtracted from the score.
    pub points: i32,
    /// Regex patterns (case-insensitive).
    pub patterns: Vec<String>,
    /// Exception patterns: if any matches, the penalty is not applied.
    #[serde(default)]
    pub unless: Vec<String>,
}

/// A category the categorizer can assign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub id: String,
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    pub core_terms: Vec<String>,
    pub macro_terms: Vec<String>,
    pub geography_terms: Vec<String>,
    pub boosters: Vec<BoosterCfg>,
    pub penalties: Vec<PenaltyCfg>,
    /// Declaration order is the categorizer's tie-break order.
    pub categories: Vec<CategoryDefinition>,
    pub default_category: String,
}

fn strings(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

fn booster(id: &str, title_points: i32, body_points: i32, keywords: &[&str]) -> BoosterCfg {
    BoosterCfg {
        id: id.into(),
        title_points,
        body_points,
        keywords: strings(keywords),
    }
}

fn penalty(id: &str, points: i32, patterns: &[&str], unless: &[&str]) -> PenaltyCfg {
    PenaltyCfg {
        id: id.into(),
        points,
        patterns: strings(patterns),
        unless: strings(unless),
    }
}

fn category(id: &str, name: &str, keywords: &[&str]) -> CategoryDefinition {
    CategoryDefinition {
        id: id.into(),
        name: name.into(),
        keywords: strings(keywords),
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        let core_terms = strings(&[
            // Core ski/snowboard terms
            "ski", "skiing", "skier", "skiers", "snowboard", "snowboarding", "snowboarder",
            "lift ticket", "lift tickets", "season pass", "ski resort", "ski area", "ski mountain",
            "chairlift", "gondola", "ski patrol", "snowmaking", "terrain park", "skier visits",
            // Resort operators and passes
            "vail resorts", "alterra", "epic pass", "ikon pass", "boyne resorts", "aspen skiing",
            "powdr",
            // North American resorts
            "whistler", "blackcomb", "park city", "deer valley", "jackson hole",
            "mammoth mountain", "palisades tahoe", "big sky", "telluride", "steamboat",
            "breckenridge", "keystone", "copper mountain", "winter park", "beaver creek",
            "arapahoe basin", "snowbird", "snowbasin", "killington", "stowe", "sugarbush",
            "jay peak", "okemo", "sun valley", "revelstoke", "lake louise", "sunshine village",
            "sun peaks", "big white", "kicking horse", "mont tremblant",
            // International resorts
            "chamonix", "zermatt", "st. moritz", "courchevel", "verbier", "kitzbuhel", "niseko",
            "perisher", "thredbo",
            // Industry terms
            "ski industry", "resort operator", "nsaa", "canada west ski areas",
        ]);

        let macro_terms = strings(&[
            "climate change", "global warming", "drought", "water shortage", "snowpack",
            "la nina", "la niña", "el nino", "el niño", "atmospheric river", "winter forecast",
            "airline", "air service", "airport expansion", "flight routes", "tourism statistics",
            "travel demand", "visitor spending", "hotel occupancy", "lodging rates",
            "labor shortage", "seasonal workers", "h-2b visa", "workforce housing",
            "housing crisis", "affordable housing", "employee housing", "second home",
            "vacation home", "mountain town", "mountain economy", "resort town",
            "tourism revenue",
        ]);

        let geography_terms = strings(&[
            "colorado", "utah", "montana", "wyoming", "idaho", "california", "nevada", "vermont",
            "new hampshire", "maine", "tahoe", "rockies", "rocky mountain", "sierra", "cascades",
            "british columbia", "alberta", "quebec", "alps", "dolomites", "pyrenees",
            "southern alps",
        ]);

        let boosters = vec![
            booster(
                "business-finance",
                3,
                2,
                &[
                    "acquisition", "acquires", "merger", "investment", "invests", "earnings",
                    "revenue", "profit", "bankruptcy", "layoffs", "layoff", "ceo", "executive",
                    "quarterly", "ipo", "private equity", "funding", "purchase agreement",
                    "sells to",
                ],
            ),
            booster(
                "weather-seasonal",
                2,
                1,
                &[
                    "snowfall", "snow forecast", "snowpack", "la nina", "la niña", "el nino",
                    "el niño", "climate change", "record snow", "winter storm",
                    "atmospheric river",
                ],
            ),
            booster(
                "international-market",
                2,
                1,
                &[
                    "canada", "canadian", "whistler", "banff", "british columbia", "europe",
                    "european", "alps", "japan", "australia",
                ],
            ),
            booster(
                "logistics-transport",
                2,
                1,
                &[
                    "airport", "airline", "air service", "nonstop", "new flight", "shuttle",
                    "highway", "i-70", "rail",
                ],
            ),
            booster(
                "lodging",
                2,
                1,
                &[
                    "hotel", "lodging", "occupancy", "vacation rental", "room rates",
                    "slopeside", "ski-in ski-out",
                ],
            ),
        ];

        let penalties = vec![
            penalty(
                "promotional",
                5,
                &[
                    r"\bsave\s+\$?\d+",
                    r"\bdeals?\s+ends?\b",
                    r"\bpromo\s*codes?\b",
                    r"\d+%\s+off\b",
                    r"\bstarting\s+at\s+\$",
                    r"\bbook\s+now\b",
                    r"\bshop\s+now\b",
                    r"\blimited\s+time\b",
                    r"\bearly\s+bird\s+(deal|special|price)",
                ],
                &[],
            ),
            penalty(
                "listicle",
                4,
                &[
                    r"\b(top|best)\s+\d+\b",
                    r"\b\d+\s+(best|top|ways|things|reasons|tips)\b",
                    r"\bbucket\s+list\b",
                    r"\bmust-visit\b",
                    r"\bhidden\s+gems?\b",
                    r"\bultimate\s+guide\b",
                    r"\btrip\s+report\b",
                    r"\bpowder\s+alert\b",
                ],
                &[
                    r"\bbest\s+(year|quarter|season|earnings|performance)\b",
                    r"\btop\s+(executive|ceo|management|official)s?\b",
                    r"\brecord\s+(revenue|profit|earnings|visits)\b",
                ],
            ),
            penalty(
                "product-review",
                4,
                &[
                    r"\bgear\s+(guide|review|roundup)\b",
                    r"\bbuying\s+guide\b",
                    r"\bgift\s+guide\b",
                    r"\b(jackets?|goggles|gloves|mittens|base\s*layers?)\b",
                    r"\breviewed\b",
                ],
                &[],
            ),
            penalty(
                "off-domain",
                4,
                &[
                    r"\bticks?\b",
                    r"\bmosquito(es)?\b",
                    r"\blyme\s+disease\b",
                    r"\bhiking\s+trails?\b",
                    r"\bmountain\s+bik(e|es|ing)\b",
                ],
                &[],
            ),
            penalty(
                "feel-good",
                3,
                &[
                    r"\bheart-?warming\b",
                    r"\bfeel-?good\b",
                    r"\badorable\b",
                    r"\bwholesome\b",
                    r"\bmelts?\s+hearts?\b",
                    r"\byou\s+won'?t\s+believe\b",
                ],
                &[],
            ),
        ];

        let categories = vec![
            category(
                "business-investment",
                "Business & Investment",
                &[
                    "acquisition", "merger", "investment", "earnings", "revenue", "profit",
                    "loss", "ipo", "bankruptcy", "layoff", "ceo", "executive", "quarterly",
                    "annual report", "partnership", "financial", "sold", "buys", "purchase",
                    "ownership", "vail resorts", "alterra", "boyne", "deal", "billion", "million",
                ],
            ),
            category(
                "safety-incidents",
                "Safety",
                &[
                    "accident", "injury", "injured", "death", "fatality", "avalanche", "rescue",
                    "safety", "collision", "lawsuit", "liability", "ski patrol", "emergency",
                    "hazard",
                ],
            ),
            category(
                "weather-snow",
                "Weather & Snow",
                &[
                    "snowfall", "snow forecast", "winter forecast", "la nina", "el nino",
                    "climate change", "global warming", "snow drought", "snowpack", "storm",
                    "blizzard", "cold front", "warm winter", "record snow", "base depth",
                    "atmospheric river",
                ],
            ),
            category(
                "resort-operations",
                "Resort Operations",
                &[
                    "lift", "chairlift", "gondola", "snowmaking", "terrain expansion",
                    "new trail", "grooming", "base lodge", "summit lodge", "lift ticket",
                    "season pass", "opening day", "season opening", "closing day",
                    "first chair", "last chair", "vertical drop", "acreage",
                ],
            ),
            category(
                "transportation",
                "Transportation",
                &[
                    "airport", "airline", "flight", "air service", "nonstop", "highway", "i-70",
                    "traffic", "shuttle", "bus service", "parking", "train", "rail",
                ],
            ),
            category(
                "hospitality",
                "Hospitality",
                &[
                    "hotel", "hotels", "lodging", "accommodation", "ski-in ski-out", "slopeside",
                    "vacation rental", "condo", "room rates", "occupancy", "booking",
                    "reservations", "hospitality", "chalet",
                ],
            ),
            category(
                "winter-sports",
                "Winter Sports",
                &[
                    "world cup", "winter olympics", "fis", "ski racing", "slalom",
                    "giant slalom", "downhill race", "super-g", "freestyle skiing", "halfpipe",
                    "slopestyle", "biathlon", "ski jumping", "x games",
                ],
            ),
            category(
                "canada",
                "Canada",
                &[
                    "canada", "canadian", "whistler", "blackcomb", "banff", "lake louise",
                    "revelstoke", "big white", "sun peaks", "fernie", "kicking horse",
                    "mont tremblant", "british columbia", "alberta", "quebec", "ontario",
                ],
            ),
            category(
                "international",
                "International",
                &[
                    "europe", "european", "alps", "japan", "japanese", "australia",
                    "new zealand", "south america", "chile", "argentina", "chamonix", "zermatt",
                    "st. moritz", "courchevel", "verbier", "kitzbuhel", "dolomites", "niseko",
                ],
            ),
            category(
                "ski-history",
                "Ski History",
                &[
                    "ski history", "skiing history", "historic ski", "abandoned ski",
                    "anniversary", "ski pioneer", "ski museum", "ski heritage", "defunct ski",
                    "former ski area", "first chairlift",
                ],
            ),
        ];

        Self {
            core_terms,
            macro_terms,
            geography_terms,
            boosters,
            penalties,
            categories,
            default_category: "resort-operations".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_has_every_section() {
        let l = Lexicon::default();
        assert!(!l.core_terms.is_empty());
        assert!(!l.macro_terms.is_empty());
        assert!(!l.geography_terms.is_empty());
        assert_eq!(l.boosters.len(), 5);
        assert_eq!(l.penalties.len(), 5);
        assert_eq!(l.categories.len(), 10);
        assert!(l.categories.iter().any(|c| c.id == l.default_category));
    }

    #[test]
    fn partial_toml_keeps_seed_for_missing_keys() {
        let l: Lexicon = toml::from_str(r#"core_terms = ["ski"]"#).unwrap();
        assert_eq!(l.core_terms, vec!["ski".to_string()]);
        assert_eq!(l.categories, Lexicon::default().categories);
    }
}
