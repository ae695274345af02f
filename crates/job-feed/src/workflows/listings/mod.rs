//! Turns a rendered careers page into an ordered, de-duplicated list of postings.

mod domain;
mod extractor;
mod normalizer;
mod selectors;

use std::collections::HashSet;

use scraper::Html;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

pub use domain::{JobGuid, JobPosting};
pub use extractor::DetailFields;
pub use selectors::ListingSelectors;

use extractor::{CardOutcome, CompiledSelectors, SkipReason};

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("no listings container matched '{selector}'; the portal layout may have changed")]
    NoListingsFound { selector: String },
    #[error("invalid {field} selector '{selector}': {message}")]
    InvalidSelector {
        field: &'static str,
        selector: String,
        message: String,
    },
}

/// Outcome of one extraction pass. Counters explain every card that did not
/// become a posting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    pub postings: Vec<JobPosting>,
    pub cards_seen: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub navigation_filtered: usize,
    pub truncated: bool,
}

#[derive(Debug)]
pub struct ListingExtractor {
    selectors: CompiledSelectors,
    listings_selector: String,
    base_url: Url,
    max_listings: Option<usize>,
}

impl ListingExtractor {
    pub fn new(selectors: &ListingSelectors, base_url: Url) -> Result<Self, ExtractionError> {
        Ok(Self {
            selectors: CompiledSelectors::compile(selectors)?,
            listings_selector: selectors.listings.clone(),
            base_url,
            max_listings: None,
        })
    }

    /// Caps the number of published postings; `0` leaves the list uncapped.
    pub fn with_max_listings(mut self, max_listings: usize) -> Self {
        self.max_listings = (max_listings > 0).then_some(max_listings);
        self
    }

    pub fn extract(&self, html: &str) -> Result<ExtractionReport, ExtractionError> {
        self.extract_relative_to(html, &self.base_url)
    }

    /// Like [`ListingExtractor::extract`], resolving relative links against
    /// `base` instead of the extractor's own base URL.
    pub fn extract_relative_to(
        &self,
        html: &str,
        base: &Url,
    ) -> Result<ExtractionReport, ExtractionError> {
        let document = Html::parse_document(html);

        if document.select(&self.selectors.listings).next().is_none() {
            return Err(ExtractionError::NoListingsFound {
                selector: self.listings_selector.clone(),
            });
        }

        let mut report = ExtractionReport::default();
        let mut seen: HashSet<JobGuid> = HashSet::new();

        for card in extractor::job_cards(&document, &self.selectors) {
            report.cards_seen += 1;

            match extractor::read_card(card, &self.selectors, base) {
                CardOutcome::Posting(posting) => {
                    if !seen.insert(posting.guid.clone()) {
                        debug!(url = %posting.url, "duplicate listing collapsed");
                        report.duplicates += 1;
                        continue;
                    }

                    if self
                        .max_listings
                        .is_some_and(|limit| report.postings.len() >= limit)
                    {
                        report.truncated = true;
                        continue;
                    }

                    report.postings.push(posting);
                }
                CardOutcome::Navigation(url) => {
                    debug!(%url, "navigation link ignored");
                    report.navigation_filtered += 1;
                }
                CardOutcome::Skipped(reason) => {
                    let reason = match reason {
                        SkipReason::MissingLink => "missing link",
                        SkipReason::MissingTitle => "missing title",
                    };
                    warn!(card = report.cards_seen, reason, "job card skipped");
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    /// Reads the title and location a job detail page advertises.
    pub fn detail(&self, html: &str) -> DetailFields {
        extractor::read_detail(html, &self.selectors)
    }
}
