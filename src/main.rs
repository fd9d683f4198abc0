//! Ski News Curator: binary entrypoint.
//! One batch run: load config, gather source batches, curate, write outputs.
//!
//! Env:
//!   CURATION_INPUT          JSON array of source batches (skips HTTP fetching)
//!   CURATION_PREVIOUS_FEED  previously published feed.json (incremental merge)
//!   CURATION_OUT_DIR        output directory, default `out/`
//!   CURATION_LOG_JSON=1     JSON log lines

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ski_news_curator::ingest::{collect_batches, providers};
use ski_news_curator::{CurationConfig, OutputFeed, Pipeline, SourceBatch};

const DEFAULT_OUT_DIR: &str = "out";
const DEFAULT_LOG_FILTER: &str =
    "ski_news_curator=info,pipeline=info,ingest=info,scoring=info,dedup=info,config=info,warn";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("CURATION_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn read_batches(path: &Path) -> anyhow::Result<Vec<SourceBatch>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading input batches at {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing input batches at {}", path.display()))
}

/// A missing or unreadable previous feed just means a full (non-incremental) run.
fn read_previous(path: &Path) -> Option<OutputFeed> {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "previous feed not readable; starting fresh");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(feed) => Some(feed),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "previous feed invalid; starting fresh");
            None
        }
    }
}

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> anyhow::Result<()> {
    let path = dir.join(name);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, &path).with_context(|| format!("renaming to {}", path.display()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("installing prometheus recorder")?;

    let config = CurationConfig::load();
    let pipeline = Pipeline::from_config(config)?;

    let batches = match std::env::var("CURATION_INPUT") {
        Ok(p) => read_batches(Path::new(&p))?,
        Err(_) => {
            let providers = providers::from_registry(pipeline.registry())?;
            info!(sources = providers.len(), "fetching feeds");
            collect_batches(&providers).await
        }
    };
    let previous = std::env::var("CURATION_PREVIOUS_FEED")
        .ok()
        .and_then(|p| read_previous(Path::new(&p)));

    let outcome = pipeline
        .run(&batches, previous.as_ref(), chrono::Utc::now())
        .await?;
    outcome.report.publish_metrics();

    let out_dir = std::env::var("CURATION_OUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUT_DIR));
    fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    write_json(&out_dir, "feed.json", &outcome.feed)?;
    write_json(&out_dir, "review.json", &outcome.review)?;
    write_json(&out_dir, "report.json", &outcome.report)?;
    fs::write(out_dir.join("metrics.prom"), metrics.render()).context("writing metrics.prom")?;

    info!(
        out_dir = %out_dir.display(),
        feed_items = outcome.feed.total_items,
        "outputs written"
    );
    Ok(())
}
