use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::config::{FeedConfig, SourceConfig};
use crate::render::{PageRenderer, RenderError, WaitCondition};
use crate::workflows::listings::{ExtractionError, ExtractionReport, JobPosting, ListingExtractor};
use crate::workflows::syndication::{FeedDocument, FeedWriter, WriteError};

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// What one run published, suitable for logs and `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestSummary {
    pub source: Url,
    pub output_path: PathBuf,
    pub built_at: DateTime<Utc>,
    pub cards_seen: usize,
    pub published: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub navigation_filtered: usize,
    pub truncated: bool,
    pub detail_lookups: usize,
    pub postings: Vec<JobPosting>,
}

/// Render, extract, publish. Any failure before the final rename leaves the
/// previously published feed untouched.
#[derive(Debug)]
pub struct FeedHarvest<'a> {
    source: &'a SourceConfig,
    feed: &'a FeedConfig,
    extractor: ListingExtractor,
    snapshot_path: Option<PathBuf>,
}

impl<'a> FeedHarvest<'a> {
    pub fn new(source: &'a SourceConfig, feed: &'a FeedConfig) -> Result<Self, HarvestError> {
        let base_url = source.base_url.clone().unwrap_or_else(|| source.url.clone());
        let extractor = ListingExtractor::new(&source.selectors, base_url)?
            .with_max_listings(source.max_listings);

        Ok(Self {
            source,
            feed,
            extractor,
            snapshot_path: None,
        })
    }

    /// Keeps a copy of the rendered listing page, for diagnosing layout changes.
    pub fn with_snapshot_path(mut self, path: Option<PathBuf>) -> Self {
        self.snapshot_path = path;
        self
    }

    pub fn run(
        &self,
        renderer: &dyn PageRenderer,
        now: DateTime<Utc>,
    ) -> Result<HarvestSummary, HarvestError> {
        info!(url = %self.source.url, "rendering listing page");
        let page = renderer.render(&self.source.url, &self.listing_wait())?;
        self.keep_snapshot(&page.html);

        let base = self.source.base_url.as_ref().unwrap_or(&page.url);
        let mut report = self.extractor.extract_relative_to(&page.html, base)?;
        let detail_lookups = if self.source.detail_lookup {
            self.enrich_placeholder_titles(renderer, &mut report.postings)
        } else {
            0
        };

        self.publish(report, detail_lookups, now)
    }

    /// Same pipeline against HTML captured earlier, without a browser.
    pub fn run_from_html(
        &self,
        html: &str,
        now: DateTime<Utc>,
    ) -> Result<HarvestSummary, HarvestError> {
        let report = self.extractor.extract(html)?;
        self.publish(report, 0, now)
    }

    fn listing_wait(&self) -> WaitCondition {
        WaitCondition {
            selector: Some(self.source.selectors.listings.clone()),
            timeout: self.source.render_timeout,
            settle: self.source.settle_delay,
            reveal_tab: self.source.tab_label.clone(),
            scroll: true,
        }
    }

    fn detail_wait(&self) -> WaitCondition {
        WaitCondition {
            settle: self.source.settle_delay,
            ..WaitCondition::for_selector(
                self.source.selectors.detail_title.clone(),
                self.source.render_timeout,
            )
        }
    }

    fn keep_snapshot(&self, html: &str) {
        if let Some(path) = &self.snapshot_path {
            match fs::write(path, html) {
                Ok(()) => info!(path = %path.display(), "rendered page saved"),
                Err(err) => warn!(path = %path.display(), error = %err, "could not save rendered page"),
            }
        }
    }

    fn enrich_placeholder_titles(
        &self,
        renderer: &dyn PageRenderer,
        postings: &mut [JobPosting],
    ) -> usize {
        let wait = self.detail_wait();
        let mut lookups = 0;

        for posting in postings.iter_mut().filter(|p| p.has_placeholder_title()) {
            lookups += 1;
            info!(url = %posting.url, title = %posting.title, "fetching job detail page");

            let page = match renderer.render(&posting.url, &wait) {
                Ok(page) => page,
                Err(err) => {
                    warn!(url = %posting.url, error = %err, "detail page unavailable; keeping card title");
                    continue;
                }
            };

            let detail = self.extractor.detail(&page.html);
            if let Some(title) = detail.title {
                posting.title = title;
            }
            if posting.location.is_none() {
                posting.location = detail.location;
            }
        }

        lookups
    }

    fn publish(
        &self,
        report: ExtractionReport,
        detail_lookups: usize,
        now: DateTime<Utc>,
    ) -> Result<HarvestSummary, HarvestError> {
        let ExtractionReport {
            postings,
            cards_seen,
            skipped,
            duplicates,
            navigation_filtered,
            truncated,
        } = report;

        if truncated {
            warn!(limit = self.source.max_listings, "listing cap reached; remaining cards dropped");
        }

        let document = FeedDocument::new(self.feed.metadata.clone(), postings, now);
        let writer = FeedWriter::new(&self.feed.output_path);
        writer.write(&document.to_rss())?;

        info!(
            path = %writer.path().display(),
            published = document.postings.len(),
            skipped,
            duplicates,
            "feed published"
        );

        Ok(HarvestSummary {
            source: self.source.url.clone(),
            output_path: self.feed.output_path.clone(),
            built_at: now,
            cards_seen,
            published: document.postings.len(),
            skipped,
            duplicates,
            navigation_filtered,
            truncated,
            detail_lookups,
            postings: document.postings,
        })
    }
}
