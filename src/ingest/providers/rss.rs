// src/ingest/providers/rss.rs
//! RSS 2.0 provider. Reads a fixture string or an HTTP endpoint and yields raw
//! records; validation happens in `ingest_batches`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

use crate::ingest::types::{FeedProvider, RawRecord};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "content:encoded", default)]
    content: Option<String>,
}

/// RFC 2822 `pubDate` to RFC 3339; anything unparseable passes through untouched.
fn normalize_pub_date(ts: &str) -> String {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| dt.to_offset(UtcOffset::UTC).format(&Rfc3339).ok())
        .unwrap_or_else(|| ts.trim().to_string())
}

pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("ski-news-curator/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(15))
        .build()
        .context("building feed http client")
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

pub struct RssProvider {
    name: String,
    mode: Mode,
}

impl RssProvider {
    pub fn from_fixture_str(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(name: &str, url: &str, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        }
    }

    pub fn parse_items_from_str(s: &str) -> Result<Vec<RawRecord>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let out: Vec<RawRecord> = rss
            .channel
            .item
            .into_iter()
            .map(|it| RawRecord {
                title: it.title,
                url: it.link,
                description: it.description,
                body: it.content,
                published: it.pub_date.as_deref().map(normalize_pub_date),
            })
            .collect();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("curation_parse_ms").record(ms);
        Ok(out)
    }
}

#[async_trait]
impl FeedProvider for RssProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawRecord>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("{} http get()", self.name))?
                    .error_for_status()
                    .with_context(|| format!("{} http status", self.name))?;
                let body = resp
                    .text()
                    .await
                    .with_context(|| format!("{} http .text()", self.name))?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// HTML entities that are not valid XML; feeds use them anyway.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
<item><title>Vail Resorts beats estimates</title><link>https://v.test/1</link>
<pubDate>Thu, 15 Jan 2026 08:30:00 +0000</pubDate><description>Skier visits up&nbsp;4%</description></item>
<item><title>Undated</title><link>https://v.test/2</link></item>
</channel></rss>"#;

    #[test]
    fn pub_date_becomes_rfc3339() {
        assert_eq!(
            normalize_pub_date("Thu, 15 Jan 2026 08:30:00 +0000"),
            "2026-01-15T08:30:00Z"
        );
        assert_eq!(normalize_pub_date("2026-01-15"), "2026-01-15");
    }

    #[tokio::test]
    async fn fixture_parses_items() {
        let p = RssProvider::from_fixture_str("Vail Daily", XML);
        let recs = p.fetch_latest().await.unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title.as_deref(), Some("Vail Resorts beats estimates"));
        assert_eq!(recs[0].published.as_deref(), Some("2026-01-15T08:30:00Z"));
        assert_eq!(recs[0].description.as_deref(), Some("Skier visits up 4%"));
        assert!(recs[1].published.is_none());
        assert_eq!(p.name(), "Vail Daily");
    }

    #[tokio::test]
    async fn malformed_xml_is_an_error() {
        let p = RssProvider::from_fixture_str("Broken", "<rss><channel>");
        assert!(p.fetch_latest().await.is_err());
    }
}
