// src/scoring/semantic.rs
//! Optional external scorer: asks a language-model provider for a 1-10 score,
//! blends it with the keyword score, and falls back to keywords on any failure.
//!
//! Failures (no key, timeout, HTTP error, unparseable reply, exhausted call
//! budget) never surface as errors; the item is keyword-scored and the outcome
//! is flagged `fell_back`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{KeywordScorer, ScoreOutcome, Scorer, SCORE_MAX, SCORE_MIN};
use crate::config::{BlendPolicy, CurationConfig, SemanticConfig};
use crate::model::{truncate_chars, FilteredItem, ScoreMethod};

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROMPT_TEXT_CHARS: usize = 600;
const REASON_MAX_CHARS: usize = 160;

/// Low-level provider: one remote completion per call. `None` on any failure.
#[async_trait]
pub trait SemanticProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Option<String>;
    fn name(&self) -> &'static str;
}

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ski-news-curator/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            api_key,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl SemanticProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str) -> Option<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: u32,
            temperature: f32,
            system: &'a str,
            messages: Vec<Msg<'a>>,
        }
        #[derive(Deserialize)]
        struct Resp {
            content: Vec<Block>,
        }
        #[derive(Deserialize)]
        struct Block {
            #[serde(default)]
            text: String,
        }

        let req = Req {
            model: &self.model,
            max_tokens: 200,
            temperature: 0.0,
            system: SYSTEM_PROMPT,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let resp = match self
            .http
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&req)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "scoring", error = %e, "semantic provider request failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!(target: "scoring", status = %resp.status(), "semantic provider returned error status");
            return None;
        }
        let body: Resp = resp.json().await.ok()?;
        let text: String = body.content.into_iter().map(|b| b.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

/// Returns `None` always; used when the provider cannot be configured.
pub struct DisabledProvider;

#[async_trait]
impl SemanticProvider for DisabledProvider {
    async fn complete(&self, _prompt: &str) -> Option<String> {
        None
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Fixed reply, for tests and local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub reply: String,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            reply: r#"{"score": 7, "category": "resort-operations", "reason": "mock assessment"}"#
                .to_string(),
        }
    }
}

#[async_trait]
impl SemanticProvider for MockProvider {
    async fn complete(&self, _prompt: &str) -> Option<String> {
        Some(self.reply.clone())
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

const SYSTEM_PROMPT: &str = "You rate news items for a ski-industry business briefing. \
Score 1-10: 9-10 major business news (acquisitions, earnings, executive changes), \
7-8 operational or market news, 4-6 local or minor news, 1-3 promotional, listicles, gear reviews or off-topic. \
Reply with JSON only: {\"score\": N, \"category\": \"<category id>\", \"reason\": \"<one short sentence>\"}.";

fn build_prompt(item: &FilteredItem) -> String {
    let it = &item.item;
    let text = if it.description.trim().is_empty() {
        &it.body
    } else {
        &it.description
    };
    format!(
        "Source: {}\nTitle: {}\nSummary: {}",
        it.source,
        it.title,
        truncate_chars(text, PROMPT_TEXT_CHARS)
    )
}

/// Parsed provider reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticAssessment {
    pub score: i32,
    pub category: Option<String>,
    pub reason: String,
}

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid json object regex"));

/// Extract the first JSON object from a free-form reply. Scores are clamped to range.
pub fn parse_assessment(reply: &str) -> Option<SemanticAssessment> {
    #[derive(Deserialize)]
    struct Raw {
        score: serde_json::Value,
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        reason: Option<String>,
    }

    let m = JSON_OBJECT.find(reply)?;
    let raw: Raw = serde_json::from_str(m.as_str()).ok()?;
    let score = match &raw.score {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !score.is_finite() {
        return None;
    }
    Some(SemanticAssessment {
        score: (score.round() as i32).clamp(SCORE_MIN, SCORE_MAX),
        category: raw
            .category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty()),
        reason: sanitize_reason(raw.reason.as_deref().unwrap_or("")),
    })
}

/// One line, printable ASCII only, bounded length.
pub(crate) fn sanitize_reason(s: &str) -> String {
    let one_line: String = s
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect();
    truncate_chars(one_line.trim(), REASON_MAX_CHARS)
}

/// Semantic scorer with a per-run call budget and keyword fallback.
pub struct SemanticScorer {
    keyword: KeywordScorer,
    provider: Arc<dyn SemanticProvider>,
    blend: BlendPolicy,
    call_limit: u32,
    calls: AtomicU32,
}

impl SemanticScorer {
    pub fn new(
        keyword: KeywordScorer,
        provider: Arc<dyn SemanticProvider>,
        blend: BlendPolicy,
        call_limit: u32,
    ) -> Self {
        Self {
            keyword,
            provider,
            blend,
            call_limit,
            calls: AtomicU32::new(0),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    fn take_call(&self) -> bool {
        self.calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.call_limit).then_some(n + 1)
            })
            .is_ok()
    }

    fn fallback(&self, keyword_score: i32, rationale: String, why: &str) -> ScoreOutcome {
        ScoreOutcome {
            score: keyword_score,
            rationale: format!("{rationale}; semantic unavailable ({why}), keyword fallback"),
            method: ScoreMethod::Keyword,
            suggested_category: None,
            fell_back: true,
        }
    }
}

#[async_trait]
impl Scorer for SemanticScorer {
    async fn score(&self, item: &FilteredItem, today: NaiveDate) -> ScoreOutcome {
        let (kw_score, kw_rationale) = self.keyword.score_item(item, today);

        if !self.take_call() {
            return self.fallback(kw_score, kw_rationale, "call limit reached");
        }
        let Some(reply) = self.provider.complete(&build_prompt(item)).await else {
            return self.fallback(kw_score, kw_rationale, "provider error");
        };
        let Some(a) = parse_assessment(&reply) else {
            debug!(target: "scoring", id = %item.item.id, "unparseable semantic reply");
            return self.fallback(kw_score, kw_rationale, "unparseable reply");
        };

        let score = self.blend.blend(kw_score, a.score).clamp(SCORE_MIN, SCORE_MAX);
        let mut rationale = format!(
            "semantic {} ({} blend with keyword {})",
            a.score,
            self.blend.as_str(),
            kw_score
        );
        if !a.reason.is_empty() {
            rationale.push_str(": ");
            rationale.push_str(&a.reason);
        }
        rationale.push_str(" | keyword: ");
        rationale.push_str(&kw_rationale);

        ScoreOutcome {
            score,
            rationale,
            method: ScoreMethod::Semantic,
            suggested_category: a.category,
            fell_back: false,
        }
    }

    fn method(&self) -> ScoreMethod {
        ScoreMethod::Semantic
    }

    fn begin_run(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

/// Factory: keyword scorer unless semantic scoring is enabled.
///
/// * provider `mock` → deterministic `MockProvider`;
/// * provider `anthropic` with a resolvable key → `AnthropicProvider`;
/// * anything else → `DisabledProvider` (every item falls back to keywords).
pub fn build_scorer(cfg: &CurationConfig) -> anyhow::Result<Box<dyn Scorer>> {
    let keyword = KeywordScorer::from_config(cfg)?;
    let sem: &SemanticConfig = &cfg.semantic;
    if !sem.enabled {
        return Ok(Box::new(keyword));
    }

    let provider: Arc<dyn SemanticProvider> = match sem.provider.as_str() {
        "mock" => Arc::new(MockProvider::default()),
        "anthropic" => match sem.resolve_api_key() {
            Some(key) => Arc::new(AnthropicProvider::new(
                key,
                &sem.model,
                Duration::from_secs(sem.timeout_secs),
            )?),
            None => {
                warn!(target: "scoring", "ANTHROPIC_API_KEY missing; semantic scoring will fall back to keywords");
                Arc::new(DisabledProvider)
            }
        },
        other => {
            warn!(target: "scoring", provider = other, "unsupported semantic provider; falling back to keywords");
            Arc::new(DisabledProvider)
        }
    };
    info!(target: "scoring", provider = provider.name(), blend = ?sem.blend, call_limit = sem.call_limit, "semantic scoring enabled");
    Ok(Box::new(SemanticScorer::new(
        keyword,
        provider,
        sem.blend,
        sem.call_limit,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use crate::model::{Pathway, RawItem};
    use crate::registry::SourceRegistry;
    use chrono::{TimeZone, Utc};

    fn item(title: &str) -> FilteredItem {
        FilteredItem {
            item: RawItem {
                id: "a".into(),
                source: "Unknown".into(),
                title: title.into(),
                description: "Ski resort news".into(),
                body: String::new(),
                published_at: Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap(),
                url: "https://example.test/a".into(),
            },
            pathway: Pathway::Core,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    fn keyword() -> KeywordScorer {
        KeywordScorer::new(&Lexicon::default(), &[], SourceRegistry::default()).unwrap()
    }

    fn mock(reply: &str) -> Arc<dyn SemanticProvider> {
        Arc::new(MockProvider {
            reply: reply.to_string(),
        })
    }

    #[test]
    fn parse_tolerates_prose_and_string_scores() {
        let a = parse_assessment(
            "Sure! {\"score\": \"8\", \"category\": \"Business-Investment\", \"reason\": \"Big\\n deal\"} thanks",
        )
        .unwrap();
        assert_eq!(a.score, 8);
        assert_eq!(a.category.as_deref(), Some("business-investment"));
        assert_eq!(a.reason, "Big deal");

        assert_eq!(parse_assessment(r#"{"score": 42}"#).unwrap().score, 10);
        assert!(parse_assessment("no json here").is_none());
        assert!(parse_assessment(r#"{"score": null}"#).is_none());
    }

    #[tokio::test]
    async fn substitute_uses_external_score() {
        let s = SemanticScorer::new(
            keyword(),
            mock(r#"{"score": 9, "category": "business-investment", "reason": "acquisition"}"#),
            BlendPolicy::Substitute,
            5,
        );
        let out = s.score(&item("Ski lift news"), today()).await;
        assert_eq!(out.score, 9);
        assert_eq!(out.method, ScoreMethod::Semantic);
        assert_eq!(out.suggested_category.as_deref(), Some("business-investment"));
        assert!(out.rationale.starts_with("semantic 9 (substitute blend with keyword 5)"));
    }

    #[tokio::test]
    async fn average_blend_rounds_half_up() {
        let s = SemanticScorer::new(keyword(), mock(r#"{"score": 8}"#), BlendPolicy::Average, 5);
        assert_eq!(s.score(&item("Ski lift news"), today()).await.score, 7);
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_keyword() {
        let s = SemanticScorer::new(
            keyword(),
            Arc::new(DisabledProvider),
            BlendPolicy::Substitute,
            5,
        );
        let out = s.score(&item("Ski lift news"), today()).await;
        assert!(out.fell_back);
        assert_eq!(out.method, ScoreMethod::Keyword);
        assert_eq!(out.score, 5);
        assert!(out.rationale.contains("keyword fallback"));
    }

    #[tokio::test]
    async fn call_limit_is_per_run() {
        let s = SemanticScorer::new(keyword(), mock(r#"{"score": 9}"#), BlendPolicy::Max, 1);
        let it = item("Ski lift news");
        assert!(!s.score(&it, today()).await.fell_back);
        let second = s.score(&it, today()).await;
        assert!(second.fell_back);
        assert!(second.rationale.contains("call limit reached"));

        s.begin_run();
        assert!(!s.score(&it, today()).await.fell_back);
    }

    #[test]
    fn factory_respects_toggle_and_provider() {
        let mut cfg = CurationConfig::default();
        assert_eq!(build_scorer(&cfg).unwrap().method(), ScoreMethod::Keyword);
        cfg.semantic.enabled = true;
        cfg.semantic.provider = "mock".into();
        assert_eq!(build_scorer(&cfg).unwrap().method(), ScoreMethod::Semantic);
    }
}
