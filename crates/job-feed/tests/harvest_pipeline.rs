use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};
use job_feed::config::{FeedConfig, SourceConfig};
use job_feed::render::{PageRenderer, RenderError, RenderedPage, WaitCondition};
use job_feed::workflows::listings::{ExtractionError, ListingSelectors};
use job_feed::workflows::syndication::FeedMetadata;
use job_feed::workflows::{FeedHarvest, HarvestError};
use url::Url;

const LISTINGS: &str = include_str!("fixtures/listings.html");
const EMPTY_LISTINGS: &str = include_str!("fixtures/empty_listings.html");
const PREVIOUS_FEED: &str = "<rss version=\"2.0\"><channel><title>yesterday</title></channel></rss>\n";

#[derive(Debug, Default)]
struct FakeRenderer {
    pages: HashMap<String, String>,
    redirects: HashMap<String, Url>,
    requests: Mutex<Vec<(String, WaitCondition)>>,
}

impl FakeRenderer {
    fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects
            .insert(from.to_string(), Url::parse(to).expect("redirect target"));
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("request log")
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }
}

impl PageRenderer for FakeRenderer {
    fn render(&self, url: &Url, wait: &WaitCondition) -> Result<RenderedPage, RenderError> {
        self.requests
            .lock()
            .expect("request log")
            .push((url.to_string(), wait.clone()));

        match self.pages.get(url.as_str()) {
            Some(html) => Ok(RenderedPage {
                url: self
                    .redirects
                    .get(url.as_str())
                    .cloned()
                    .unwrap_or_else(|| url.clone()),
                html: html.clone(),
            }),
            None => Err(RenderError::NavigationTimeout {
                url: url.clone(),
                timeout: wait.timeout,
            }),
        }
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "job-feed-harvest-{name}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

fn source_url() -> Url {
    Url::parse("https://jobs.greenclimate.fund/en/sites/CX_1001/jobs").expect("source url")
}

fn source_config() -> SourceConfig {
    SourceConfig {
        url: source_url(),
        base_url: None,
        render_timeout: Duration::from_secs(5),
        settle_delay: Duration::ZERO,
        tab_label: Some("Staffs".to_string()),
        max_listings: 50,
        detail_lookup: true,
        chrome_executable: None,
        selectors: ListingSelectors::default(),
    }
}

fn feed_config(output_path: &Path) -> FeedConfig {
    FeedConfig {
        output_path: output_path.to_path_buf(),
        metadata: FeedMetadata {
            title: "Green Climate Fund Jobs".to_string(),
            link: source_url(),
            description: "Job listings from Green Climate Fund".to_string(),
            language: "en-us".to_string(),
            self_link: None,
        },
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 18, 5, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[test]
fn harvest_publishes_rendered_listings() {
    let dir = scratch_dir("publish");
    let output = dir.join("gcf_jobs.xml");
    let source = source_config();
    let feed = feed_config(&output);
    let renderer = FakeRenderer::default().with_page(source_url().as_str(), LISTINGS);

    let summary = FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .run(&renderer, now())
        .expect("harvest succeeds");

    assert_eq!(summary.published, 3);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.detail_lookups, 0);
    assert_eq!(renderer.requested(), [source_url().to_string()]);

    let xml = fs::read_to_string(&output).expect("feed written");
    let channel = rss::Channel::read_from(xml.as_bytes()).expect("feed parses");
    let titles: Vec<_> = channel.items().iter().filter_map(|item| item.title()).collect();
    assert_eq!(
        titles,
        [
            "Senior Climate Finance Specialist",
            "Legal Counsel <Contracts>",
            "Consultant \"Readiness\" Programme",
        ]
    );
    fs::remove_dir_all(dir).ok();
}

#[test]
fn listing_render_waits_for_the_container_and_reveals_the_tab() {
    let dir = scratch_dir("wait");
    let source = source_config();
    let feed = feed_config(&dir.join("feed.xml"));
    let renderer = FakeRenderer::default().with_page(source_url().as_str(), EMPTY_LISTINGS);

    FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .run(&renderer, now())
        .expect("harvest succeeds");

    let requests = renderer.requests.lock().expect("request log");
    let (_, wait) = &requests[0];
    assert_eq!(wait.selector.as_deref(), Some(source.selectors.listings.as_str()));
    assert_eq!(wait.reveal_tab.as_deref(), Some("Staffs"));
    assert!(wait.scroll);
    assert_eq!(wait.timeout, Duration::from_secs(5));
    drop(requests);
    fs::remove_dir_all(dir).ok();
}

#[test]
fn empty_listing_page_publishes_a_valid_empty_feed() {
    let dir = scratch_dir("empty");
    let output = dir.join("gcf_jobs.xml");
    let source = source_config();
    let feed = feed_config(&output);
    let renderer = FakeRenderer::default().with_page(source_url().as_str(), EMPTY_LISTINGS);

    let summary = FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .run(&renderer, now())
        .expect("empty listings are not an error");

    assert_eq!(summary.published, 0);
    let xml = fs::read_to_string(&output).expect("feed written");
    let channel = rss::Channel::read_from(xml.as_bytes()).expect("feed parses");
    assert!(channel.items().is_empty());
    assert_eq!(
        channel.last_build_date(),
        Some("Sat, 18 Oct 2025 05:00:00 +0000")
    );
    fs::remove_dir_all(dir).ok();
}

#[test]
fn render_failure_leaves_previous_feed_untouched() {
    let dir = scratch_dir("render-failure");
    let output = dir.join("gcf_jobs.xml");
    fs::write(&output, PREVIOUS_FEED).expect("seed previous feed");
    let source = source_config();
    let feed = feed_config(&output);

    let error = FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .run(&FakeRenderer::default(), now())
        .expect_err("render fails");

    assert!(matches!(
        error,
        HarvestError::Render(RenderError::NavigationTimeout { .. })
    ));
    assert_eq!(fs::read(&output).expect("read"), PREVIOUS_FEED.as_bytes());
    assert_eq!(fs::read_dir(&dir).expect("read dir").count(), 1);
    fs::remove_dir_all(dir).ok();
}

#[test]
fn missing_listing_container_leaves_previous_feed_untouched() {
    let dir = scratch_dir("layout-change");
    let output = dir.join("gcf_jobs.xml");
    fs::write(&output, PREVIOUS_FEED).expect("seed previous feed");
    let source = source_config();
    let feed = feed_config(&output);
    let renderer = FakeRenderer::default().with_page(
        source_url().as_str(),
        "<html><body><main>Maintenance in progress</main></body></html>",
    );

    let error = FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .run(&renderer, now())
        .expect_err("layout change is fatal");

    assert!(matches!(
        error,
        HarvestError::Extraction(ExtractionError::NoListingsFound { .. })
    ));
    assert_eq!(fs::read_to_string(&output).expect("read"), PREVIOUS_FEED);
    fs::remove_dir_all(dir).ok();
}

#[test]
fn placeholder_titles_are_replaced_from_detail_pages() {
    let dir = scratch_dir("detail");
    let output = dir.join("gcf_jobs.xml");
    let source = source_config();
    let feed = feed_config(&output);

    let listing = r#"<html><body><ul class="jobs-list__list">
        <li class="jobs-list__list-item"><a href="/en/sites/CX_1001/job/88">88</a></li>
        <li class="jobs-list__list-item"><a href="/en/sites/CX_1001/job/89">Position 89</a></li>
        <li class="jobs-list__list-item"><a href="/en/sites/CX_1001/job/90">Knowledge Management Officer</a></li>
      </ul></body></html>"#;
    let detail = r#"<html><body>
        <h1>Principal Evaluation Specialist</h1>
        <p>Posting Location: Incheon, Republic of Korea</p>
      </body></html>"#;

    let renderer = FakeRenderer::default()
        .with_page(source_url().as_str(), listing)
        .with_page("https://jobs.greenclimate.fund/en/sites/CX_1001/job/88", detail);

    let summary = FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .run(&renderer, now())
        .expect("harvest succeeds despite one failed detail page");

    assert_eq!(summary.detail_lookups, 2);
    assert_eq!(summary.postings[0].title, "Principal Evaluation Specialist");
    assert_eq!(
        summary.postings[0].location.as_deref(),
        Some("Incheon, Republic of Korea")
    );
    assert_eq!(summary.postings[1].title, "Position 89");
    assert_eq!(summary.postings[2].title, "Knowledge Management Officer");
    assert_eq!(
        renderer.requested(),
        [
            source_url().to_string(),
            "https://jobs.greenclimate.fund/en/sites/CX_1001/job/88".to_string(),
            "https://jobs.greenclimate.fund/en/sites/CX_1001/job/89".to_string(),
        ]
    );
    fs::remove_dir_all(dir).ok();
}

#[test]
fn detail_lookup_can_be_disabled() {
    let dir = scratch_dir("no-detail");
    let mut source = source_config();
    source.detail_lookup = false;
    let feed = feed_config(&dir.join("feed.xml"));
    let listing = r#"<ul class="jobs-list__list">
        <li class="jobs-list__list-item"><a href="/job/88">88</a></li></ul>"#;
    let renderer = FakeRenderer::default().with_page(source_url().as_str(), listing);

    let summary = FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .run(&renderer, now())
        .expect("harvest succeeds");

    assert_eq!(summary.detail_lookups, 0);
    assert_eq!(summary.postings[0].title, "88");
    assert_eq!(renderer.requested().len(), 1);
    fs::remove_dir_all(dir).ok();
}

#[test]
fn offline_run_uses_saved_html_and_keeps_snapshot_optional() {
    let dir = scratch_dir("offline");
    let output = dir.join("gcf_jobs.xml");
    let source = source_config();
    let feed = feed_config(&output);

    let summary = FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .run_from_html(LISTINGS, now())
        .expect("offline harvest succeeds");

    assert_eq!(summary.published, 3);
    let json = serde_json::to_value(&summary).expect("summary serializes");
    assert_eq!(json["published"], 3);
    assert_eq!(json["postings"][0]["title"], "Senior Climate Finance Specialist");
    assert!(output.exists());
    fs::remove_dir_all(dir).ok();
}

#[test]
fn snapshot_path_receives_rendered_html() {
    let dir = scratch_dir("snapshot");
    let snapshot = dir.join("debug_page.html");
    let source = source_config();
    let feed = feed_config(&dir.join("feed.xml"));
    let renderer = FakeRenderer::default().with_page(source_url().as_str(), EMPTY_LISTINGS);

    FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .with_snapshot_path(Some(snapshot.clone()))
        .run(&renderer, now())
        .expect("harvest succeeds");

    assert_eq!(fs::read_to_string(&snapshot).expect("snapshot"), EMPTY_LISTINGS);
    fs::remove_dir_all(dir).ok();
}

const RELATIVE_LISTING: &str = r#"<html><body><ul class="jobs-list__list">
    <li class="jobs-list__list-item"><a href="/job/1">Programme Analyst</a></li>
  </ul></body></html>"#;

fn other_portal_source() -> SourceConfig {
    SourceConfig {
        url: Url::parse("https://careers.other.org/jobs").expect("source url"),
        ..source_config()
    }
}

#[test]
fn relative_links_resolve_against_the_rendered_portal() {
    let dir = scratch_dir("other-portal");
    let source = other_portal_source();
    let feed = feed_config(&dir.join("feed.xml"));
    let renderer = FakeRenderer::default().with_page("https://careers.other.org/jobs", RELATIVE_LISTING);

    let summary = FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .run(&renderer, now())
        .expect("harvest succeeds");

    assert_eq!(
        summary.postings[0].url.as_str(),
        "https://careers.other.org/job/1"
    );
    fs::remove_dir_all(dir).ok();
}

#[test]
fn relative_links_follow_redirects() {
    let dir = scratch_dir("redirect");
    let source = other_portal_source();
    let feed = feed_config(&dir.join("feed.xml"));
    let renderer = FakeRenderer::default()
        .with_page("https://careers.other.org/jobs", RELATIVE_LISTING)
        .with_redirect("https://careers.other.org/jobs", "https://hcm.vendor.example/site/jobs");

    let summary = FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .run(&renderer, now())
        .expect("harvest succeeds");

    assert_eq!(
        summary.postings[0].url.as_str(),
        "https://hcm.vendor.example/job/1"
    );
    fs::remove_dir_all(dir).ok();
}

#[test]
fn saved_html_resolves_against_the_source_url() {
    let dir = scratch_dir("other-portal-offline");
    let source = other_portal_source();
    let feed = feed_config(&dir.join("feed.xml"));

    let summary = FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .run_from_html(RELATIVE_LISTING, now())
        .expect("offline harvest succeeds");

    assert_eq!(
        summary.postings[0].url.as_str(),
        "https://careers.other.org/job/1"
    );
    fs::remove_dir_all(dir).ok();
}

#[test]
fn configured_base_url_wins_over_the_page_address() {
    let dir = scratch_dir("base-override");
    let source = SourceConfig {
        base_url: Some(Url::parse("https://apply.other.org").expect("base url")),
        ..other_portal_source()
    };
    let feed = feed_config(&dir.join("feed.xml"));
    let renderer = FakeRenderer::default().with_page("https://careers.other.org/jobs", RELATIVE_LISTING);

    let summary = FeedHarvest::new(&source, &feed)
        .expect("harvest builds")
        .run(&renderer, now())
        .expect("harvest succeeds");

    assert_eq!(summary.postings[0].url.as_str(), "https://apply.other.org/job/1");
    fs::remove_dir_all(dir).ok();
}
