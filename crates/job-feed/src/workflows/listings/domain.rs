use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};
use url::Url;

use super::normalizer::canonical_url;

/// Stable identity of a posting across runs, derived from its canonical URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobGuid(String);

impl JobGuid {
    pub fn from_url(url: &Url) -> Self {
        let digest = Sha256::digest(canonical_url(url).as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPosting {
    pub title: String,
    pub url: Url,
    pub location: Option<String>,
    pub department: Option<String>,
    pub posted_date: Option<String>,
    pub guid: JobGuid,
}

impl JobPosting {
    /// Builds a posting from already-normalized fields. Returns `None` when the
    /// title is empty, since a posting without a title is never published.
    pub fn new(title: String, url: Url) -> Option<Self> {
        if title.trim().is_empty() {
            return None;
        }

        let guid = JobGuid::from_url(&url);
        Some(Self {
            title,
            url,
            location: None,
            department: None,
            posted_date: None,
            guid,
        })
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    pub fn with_department(mut self, department: Option<String>) -> Self {
        self.department = department;
        self
    }

    pub fn with_posted_date(mut self, posted_date: Option<String>) -> Self {
        self.posted_date = posted_date;
        self
    }

    /// Card titles that only name a requisition number are placeholders worth
    /// replacing from the detail page.
    pub fn has_placeholder_title(&self) -> bool {
        self.title.chars().count() < 5 || self.title.starts_with("Position")
    }

    /// Human-readable summary used as the feed item description.
    pub fn summary(&self) -> String {
        let mut parts = vec![self.title.clone()];
        if let Some(location) = &self.location {
            parts.push(format!("Location: {location}"));
        }
        if let Some(department) = &self.department {
            parts.push(format!("Department: {department}"));
        }
        parts.join(" | ")
    }
}
