// tests/scenarios.rs
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use ski_news_curator::config::CurationConfig;
use ski_news_curator::interleave::longest_source_run;
use ski_news_curator::lexicon::Lexicon;
use ski_news_curator::model::{DedupGroup, FilteredItem, Pathway, RawItem};
use ski_news_curator::registry::{SourceDescriptor, SourceRegistry};
use ski_news_curator::scoring::KeywordScorer;
use ski_news_curator::{Pipeline, RawRecord, SourceBatch};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 20, 6, 0, 0).unwrap()
}

fn record(title: &str, url: &str, description: &str, hours_ago: i64) -> RawRecord {
    RawRecord {
        title: Some(title.into()),
        url: Some(url.into()),
        description: Some(description.into()),
        body: None,
        published: Some((now() - Duration::hours(hours_ago)).to_rfc3339()),
    }
}

fn scorer_with_boost(source: &str, boost: i32) -> KeywordScorer {
    let reg = SourceRegistry::new(vec![SourceDescriptor {
        name: source.into(),
        endpoint: "https://wire.test/rss".into(),
        category: "business".into(),
        boost,
    }]);
    KeywordScorer::new(&Lexicon::default(), &[], reg).unwrap()
}

fn filtered(source: &str, title: &str) -> FilteredItem {
    FilteredItem {
        item: RawItem {
            id: "scenario".into(),
            source: source.into(),
            title: title.into(),
            description: String::new(),
            body: String::new(),
            published_at: now(),
            url: "https://wire.test/a".into(),
        },
        pathway: Pathway::Core,
    }
}

fn today() -> NaiveDate {
    now().date_naive()
}

#[test]
fn scenario_a_business_investment_with_source_boost() {
    let s = scorer_with_boost("Resort Wire", 2);
    let (score, rationale) = s.score_item(
        &filtered("Resort Wire", "Resort Co. announces $40M investment in new lift"),
        today(),
    );
    assert!(score >= 8, "score {score}: {rationale}");
    assert_eq!(score, 10);
    assert!(rationale.contains("business-finance"));
    assert!(rationale.contains("source +2"));
}

#[test]
fn scenario_b_listicle_gear_piece_scores_low() {
    let s = scorer_with_boost("Resort Wire", 0);
    let (score, rationale) = s.score_item(
        &filtered("Gear Blog", "10 best ski jackets this season"),
        today(),
    );
    assert!(score <= 2, "score {score}: {rationale}");
}

#[tokio::test]
async fn scenario_c_suffix_stripped_titles_merge() {
    let p = Pipeline::from_config(CurationConfig::default()).unwrap();
    let desc = "The ski resort operator reported earnings ahead of expectations.";
    let out = p
        .run(
            &[
                SourceBatch {
                    source: "Source A".into(),
                    records: vec![record(
                        "Mountain Co. posts record Q3 - Source A",
                        "https://a.test/q3",
                        desc,
                        3,
                    )],
                },
                SourceBatch {
                    source: "Source B".into(),
                    records: vec![record(
                        "Mountain Co. posts record Q3 - Source B",
                        "https://b.test/q3",
                        desc,
                        2,
                    )],
                },
            ],
            None,
            now(),
        )
        .await
        .unwrap();

    assert_eq!(out.feed.items.len(), 1, "{:#?}", out.feed.items);
    let group: DedupGroup = out.feed.items[0].clone().into_group();
    let mut sources = group.reported_by();
    sources.sort();
    assert_eq!(sources, vec!["Source A", "Source B"]);
    assert_eq!(group.also_reported_by.len(), 1);
    assert_eq!(out.report.duplicates_folded, 1);
}

const X_TITLES: [&str; 12] = [
    "Vail Resorts earnings beat analyst forecasts",
    "Alterra acquires independent ski area in Maine",
    "Boyne Resorts names new CEO for its western division",
    "Powdr invests in snowmaking at Copper Mountain",
    "Aspen Skiing reports revenue jump from lift tickets",
    "Jackson Hole secures funding for new tram",
    "Killington profit climbs on strong holiday weeks",
    "Deer Valley merger talks with Park City ski group",
    "Big Sky executive outlines quarterly ski visit trends",
    "Telluride ski resort investment plan approved by county",
    "Steamboat acquisition closes after regulatory review",
    "Whistler Blackcomb revenue slips as snowfall lags",
];

const Y_TITLES: [&str; 3] = [
    "Ski industry layoffs hit ticket offices in Vermont",
    "Sun Valley ski resort investment targets new lodge",
    "Snowbird earnings call highlights skier visits",
];

#[tokio::test]
async fn scenario_d_diversity_caps_and_round_robin() {
    let mut cfg = CurationConfig::default();
    cfg.output.max_items = 6;
    let p = Pipeline::from_config(cfg).unwrap();

    let x = SourceBatch {
        source: "Source X".into(),
        records: X_TITLES
            .iter()
            .enumerate()
            .map(|(i, t)| record(t, &format!("https://x.test/{i}"), "", i as i64))
            .collect(),
    };
    let y = SourceBatch {
        source: "Source Y".into(),
        records: Y_TITLES
            .iter()
            .enumerate()
            .map(|(i, t)| record(t, &format!("https://y.test/{i}"), "", 2 + 3 * i as i64))
            .collect(),
    };
    let out = p.run(&[x, y], None, now()).await.unwrap();

    let pre = out.report.stage("pre_scoring_cap").unwrap();
    assert_eq!((pre.entered, pre.left), (15, 8));

    let from = |s: &str| out.feed.items.iter().filter(|i| i.source == s).count();
    assert!(from("Source X") <= 3);
    assert_eq!(from("Source Y"), 3);
    assert_eq!(out.feed.items.len(), 6);

    let groups: Vec<DedupGroup> = out.feed.items.iter().cloned().map(|i| i.into_group()).collect();
    assert_eq!(longest_source_run(&groups), 1);
}

#[tokio::test]
async fn scenario_e_irrelevant_item_is_filtered_not_rejected() {
    let p = Pipeline::from_config(CurationConfig::default()).unwrap();
    let out = p
        .run(
            &[SourceBatch {
                source: "Markets Daily".into(),
                records: vec![
                    record(
                        "Stock market closes higher on tech rally",
                        "https://m.test/1",
                        "Investors cheered chipmaker results.",
                        1,
                    ),
                    record(
                        "Snowpack builds at Breckenridge after storm",
                        "https://m.test/2",
                        "",
                        2,
                    ),
                ],
            }],
            None,
            now(),
        )
        .await
        .unwrap();

    let everywhere = out
        .feed
        .items
        .iter()
        .chain(out.review.pending.iter())
        .chain(out.review.rejected.iter());
    assert!(everywhere.clone().all(|i| !i.title.contains("Stock market")));
    assert_eq!(everywhere.count(), 1);

    let rel = out.report.stage("relevance").unwrap();
    assert_eq!((rel.entered, rel.left), (2, 1));
}
