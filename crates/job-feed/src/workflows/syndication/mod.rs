//! RSS 2.0 rendering and publishing of harvested postings.

mod dates;
mod writer;
mod xml;

use chrono::{DateTime, Utc};
use url::Url;

use crate::workflows::listings::JobPosting;

pub use dates::{format_rfc822, parse_posted_date};
pub use writer::{FeedWriter, WriteError};

/// Channel-level fields of the published feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMetadata {
    pub title: String,
    pub link: Url,
    pub description: String,
    pub language: String,
    pub self_link: Option<Url>,
}

/// One run's feed: metadata, build time and postings in discovery order.
#[derive(Debug, Clone)]
pub struct FeedDocument {
    pub metadata: FeedMetadata,
    pub last_build: DateTime<Utc>,
    pub postings: Vec<JobPosting>,
}

impl FeedDocument {
    pub fn new(metadata: FeedMetadata, postings: Vec<JobPosting>, last_build: DateTime<Utc>) -> Self {
        Self {
            metadata,
            last_build,
            postings,
        }
    }

    /// Serializes the document. Output depends only on the document's fields,
    /// so two renders differ at most in `lastBuildDate`.
    pub fn to_rss(&self) -> String {
        let mut buffer = String::new();
        xml::write_rss(&mut buffer, self).expect("writing to a String cannot fail");
        buffer
    }
}
