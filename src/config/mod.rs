// src/config/mod.rs
//! Curation configuration (TOML), loaded once per run.
//!
//! Resolution: `$CURATION_CONFIG_PATH` or `config/curation.toml`. A missing or
//! invalid file falls back to `CurationConfig::default()`; this is a best-effort
//! curation tool, so it never fails closed on config.

pub mod semantic;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::categorize::Categorizer;
use crate::error::CurationError;
use crate::lexicon::Lexicon;
use crate::model::ScoreMethod;
use crate::registry::{SourceDescriptor, SourceRegistry};
use crate::relevance::RelevanceFilter;
use crate::scoring::{KeywordScorer, SCORE_MAX, SCORE_MIN};

pub use semantic::{BlendPolicy, SemanticConfig};

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/curation.toml";
pub const ENV_CONFIG_PATH: &str = "CURATION_CONFIG_PATH";
pub const ENV_APPROVE_THRESHOLD: &str = "CURATION_APPROVE_THRESHOLD";
pub const ENV_REJECT_THRESHOLD: &str = "CURATION_REJECT_THRESHOLD";
pub const ENV_ENABLE_SEMANTIC: &str = "ENABLE_SEMANTIC_SCORING";

/// Approve / reject cut-offs. `approve > reject` after sanitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub approve: i32,
    pub reject: i32,
}

impl Thresholds {
    pub const KEYWORD: Self = Self {
        approve: 6,
        reject: 3,
    };
    pub const SEMANTIC: Self = Self {
        approve: 7,
        reject: 3,
    };

    /// Clamp into the score range; restore `fallback` if the band collapses.
    fn sanitized(self, fallback: Self) -> Self {
        let t = Self {
            approve: self.approve.clamp(SCORE_MIN, SCORE_MAX),
            reject: self.reject.clamp(SCORE_MIN, SCORE_MAX),
        };
        if t.approve <= t.reject {
            warn!(
                target: "config",
                approve = t.approve,
                reject = t.reject,
                "approve threshold must exceed reject threshold; using defaults"
            );
            fallback
        } else {
            t
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSets {
    pub keyword: Thresholds,
    pub semantic: Thresholds,
}

impl ThresholdSets {
    /// Band for an item scored by `method`; keyword fallbacks use the keyword band.
    pub fn for_method(&self, method: ScoreMethod) -> Thresholds {
        match method {
            ScoreMethod::Keyword => self.keyword,
            ScoreMethod::Semantic => self.semantic,
        }
    }
}

impl Default for ThresholdSets {
    fn default() -> Self {
        Self {
            keyword: Thresholds::KEYWORD,
            semantic: Thresholds::SEMANTIC,
        }
    }
}

/// Temporary, operator-supplied boost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusTopic {
    pub phrase: String,
    pub weight: i32,
    /// Last day the boost applies (inclusive). Quoted `"YYYY-MM-DD"` in TOML.
    #[serde(default)]
    pub expires: Option<NaiveDate>,
}

impl FocusTopic {
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.expires.is_none_or(|d| today <= d)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringCfg {
    pub thresholds: ThresholdSets,
    pub focus_topics: Vec<FocusTopic>,
    /// Upper bound on items scored per run (after the pre-scoring cap).
    pub max_scored_per_run: usize,
}

impl Default for ScoringCfg {
    fn default() -> Self {
        Self {
            thresholds: ThresholdSets::default(),
            focus_topics: Vec::new(),
            max_scored_per_run: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiversityCfg {
    /// Generous cap applied before scoring.
    pub max_per_source: usize,
    /// Strict cap applied to the approved set before interleaving.
    pub max_per_source_output: usize,
}

impl Default for DiversityCfg {
    fn default() -> Self {
        Self {
            max_per_source: 5,
            max_per_source_output: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupCfg {
    pub title_similarity: f64,
    pub lead_similarity: f64,
    /// Minimum lead length (chars) on both sides before leads are compared.
    pub min_lead_length: usize,
}

impl Default for DedupCfg {
    fn default() -> Self {
        Self {
            title_similarity: 0.85,
            lead_similarity: 0.80,
            min_lead_length: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputCfg {
    pub max_items: usize,
    pub max_rejected: usize,
    pub max_pending: usize,
}

impl Default for OutputCfg {
    fn default() -> Self {
        Self {
            max_items: 50,
            max_rejected: 100,
            max_pending: 100,
        }
    }
}

/// Immutable configuration passed into every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    pub scoring: ScoringCfg,
    pub diversity: DiversityCfg,
    pub dedup: DedupCfg,
    pub output: OutputCfg,
    pub semantic: SemanticConfig,
    pub lexicon: Lexicon,
    pub sources: Vec<SourceDescriptor>,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringCfg::default(),
            diversity: DiversityCfg::default(),
            dedup: DedupCfg::default(),
            output: OutputCfg::default(),
            semantic: SemanticConfig::default(),
            lexicon: Lexicon::default(),
            sources: SourceRegistry::default_seed().sources().to_vec(),
        }
    }
}

// parse optional int env
fn parse_int_env(raw: Option<String>) -> Option<i32> {
    raw.and_then(|s| s.trim().parse::<i32>().ok())
}

fn parse_bool_env(raw: Option<String>) -> Option<bool> {
    raw.map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

impl CurationConfig {
    /// Load from `$CURATION_CONFIG_PATH` or the default path, then apply env overrides.
    /// Never fails: unreadable or invalid files fall back to defaults.
    pub fn load() -> Self {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut cfg = Self::load_from_path_or_default(&path);
        cfg.apply_env_overrides();
        cfg.sanitize();
        cfg
    }

    /// Load from an explicit file; falls back to defaults on any error.
    pub fn load_from_path_or_default(path: &Path) -> Self {
        match Self::load_from_path(path) {
            Ok(cfg) => {
                info!(target: "config", path = %path.display(), "curation config loaded");
                cfg
            }
            Err(e) => {
                warn!(target: "config", error = %e, "using built-in curation defaults");
                Self::default()
            }
        }
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read curation config at {}: {}", path.display(), e)
        })?;
        Ok(Self::from_toml_str(&content)?)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, CurationError> {
        let mut cfg: Self =
            toml::from_str(toml_str).map_err(|e| CurationError::Config(e.to_string()))?;
        cfg.sanitize();
        cfg.check_patterns()
            .map_err(|e| CurationError::Config(format!("invalid lexicon or focus topic: {e:#}")))?;
        Ok(cfg)
    }

    /// Compile every pattern the stages build from this config.
    pub fn check_patterns(&self) -> anyhow::Result<()> {
        RelevanceFilter::from_lexicon(&self.lexicon)?;
        Categorizer::from_lexicon(&self.lexicon)?;
        KeywordScorer::from_config(self)?;
        Ok(())
    }

    /// Env overrides: approve/reject for the active mode, semantic toggle.
    pub fn apply_env_overrides(&mut self) {
        if let Some(on) = parse_bool_env(std::env::var(ENV_ENABLE_SEMANTIC).ok()) {
            self.semantic.enabled = on;
        }
        let semantic = self.semantic.enabled;
        let active = if semantic {
            &mut self.scoring.thresholds.semantic
        } else {
            &mut self.scoring.thresholds.keyword
        };
        if let Some(a) = parse_int_env(std::env::var(ENV_APPROVE_THRESHOLD).ok()) {
            active.approve = a;
        }
        if let Some(r) = parse_int_env(std::env::var(ENV_REJECT_THRESHOLD).ok()) {
            active.reject = r;
        }
    }

    /// Harden values that would break stage invariants.
    pub fn sanitize(&mut self) {
        let t = &mut self.scoring.thresholds;
        t.keyword = t.keyword.sanitized(Thresholds::KEYWORD);
        t.semantic = t.semantic.sanitized(Thresholds::SEMANTIC);

        let d = &mut self.diversity;
        d.max_per_source = d.max_per_source.max(1);
        d.max_per_source_output = d.max_per_source_output.clamp(1, d.max_per_source);

        let dd = &mut self.dedup;
        if !(0.0..=1.0).contains(&dd.title_similarity) {
            dd.title_similarity = DedupCfg::default().title_similarity;
        }
        if !(0.0..=1.0).contains(&dd.lead_similarity) {
            dd.lead_similarity = DedupCfg::default().lead_similarity;
        }

        self.scoring.focus_topics.retain(|f| !f.phrase.trim().is_empty());
        self.semantic.sanitize();
    }

    /// Thresholds for the configured scoring mode.
    pub fn active_thresholds(&self) -> Thresholds {
        if self.semantic.enabled {
            self.scoring.thresholds.semantic
        } else {
            self.scoring.thresholds.keyword
        }
    }

    pub fn registry(&self) -> SourceRegistry {
        SourceRegistry::new(self.sources.clone())
    }
}
