// src/config/semantic.rs
use serde::{Deserialize, Serialize};
use std::env;

fn default_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}
fn default_call_limit() -> u32 {
    30
}
fn default_timeout_secs() -> u64 {
    20
}

/// How a semantic score combines with the keyword score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendPolicy {
    /// Semantic score replaces the keyword score.
    #[default]
    Substitute,
    /// Rounded mean of both.
    Average,
    /// Higher of both.
    Max,
}

impl BlendPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            BlendPolicy::Substitute => "substitute",
            BlendPolicy::Average => "average",
            BlendPolicy::Max => "max",
        }
    }

    pub fn blend(self, keyword: i32, semantic: i32) -> i32 {
        match self {
            BlendPolicy::Substitute => semantic,
            // half-up rounding on integers
            BlendPolicy::Average => (keyword + semantic + 1).div_euclid(2),
            BlendPolicy::Max => keyword.max(semantic),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    pub enabled: bool,
    /// "anthropic" | "mock" (case-insensitive)
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from ANTHROPIC_API_KEY
    pub api_key: String,
    /// Max provider calls per run; further items are keyword-scored.
    #[serde(default = "default_call_limit")]
    pub call_limit: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub blend: BlendPolicy,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "anthropic".into(),
            model: default_model(),
            api_key: "ENV".into(),
            call_limit: default_call_limit(),
            timeout_secs: default_timeout_secs(),
            blend: BlendPolicy::default(),
        }
    }
}

impl SemanticConfig {
    pub(crate) fn sanitize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();
        if self.model.trim().is_empty() {
            self.model = default_model();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
    }

    /// Resolve the key; `None` when it is unset (the scorer then falls back to keywords).
    pub fn resolve_api_key(&self) -> Option<String> {
        let raw = if self.api_key.trim().eq_ignore_ascii_case("env") {
            env::var("ANTHROPIC_API_KEY").ok()?
        } else {
            self.api_key.clone()
        };
        let key = raw.trim().to_string();
        (!key.is_empty()).then_some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_policies() {
        assert_eq!(BlendPolicy::Substitute.blend(4, 9), 9);
        assert_eq!(BlendPolicy::Average.blend(4, 9), 7);
        assert_eq!(BlendPolicy::Average.blend(6, 8), 7);
        assert_eq!(BlendPolicy::Max.blend(8, 3), 8);
    }

    #[test]
    fn literal_key_is_used_and_blank_is_none() {
        let mut c = SemanticConfig {
            api_key: " sk-test ".into(),
            ..Default::default()
        };
        assert_eq!(c.resolve_api_key().as_deref(), Some("sk-test"));
        c.api_key = "   ".into();
        assert_eq!(c.resolve_api_key(), None);
    }

    #[test]
    fn sanitize_normalizes_provider() {
        let mut c = SemanticConfig {
            provider: " Mock ".into(),
            model: String::new(),
            timeout_secs: 0,
            ..Default::default()
        };
        c.sanitize();
        assert_eq!(c.provider, "mock");
        assert_eq!(c.model, default_model());
        assert_eq!(c.timeout_secs, 20);
    }
}
