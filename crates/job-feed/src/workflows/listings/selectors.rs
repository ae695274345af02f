/// CSS selectors describing the portal's listing markup.
///
/// Defaults target the Oracle HCM candidate-experience pages; every selector
/// is a selector group so alternate layouts can be listed side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSelectors {
    /// Element whose presence proves the job list rendered, even when empty.
    pub listings: String,
    /// One repeating job card inside the listings container.
    pub card: String,
    pub title: String,
    pub link: String,
    pub location: String,
    pub department: String,
    pub posted_date: String,
    /// Heading on a job detail page.
    pub detail_title: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            listings: "ul.jobs-list__list, [data-qa='searchResultsList'], \
                       [data-automation-id='jobResults']"
                .to_string(),
            card: "li.jobs-list__list-item, [data-qa='searchResultItem'], \
                   [data-automation-id='jobCard'], article.job-tile"
                .to_string(),
            title: ".job-tile__title, .job-list-item__title, h2[class*='title'], \
                    h3[class*='title'], h4[class*='title'], span[class*='title']"
                .to_string(),
            link: "a[href]".to_string(),
            location: "[class*='location'], [data-qa='searchResultLocation']".to_string(),
            department: "[class*='department'], [class*='category']".to_string(),
            posted_date: "time, [class*='posting-date'], [class*='posted']".to_string(),
            detail_title: "h1, h2[class*='title'], h3[class*='title']".to_string(),
        }
    }
}

/// Text fragments that identify a location when the card has no location element.
pub(crate) const LOCATION_HINTS: &[&str] = &[
    "Remote",
    "Hybrid",
    "Incheon",
    "Republic of Korea",
    "Korea",
];

/// Labels that introduce the location on a job detail page.
pub(crate) const DETAIL_LOCATION_LABELS: &[&str] = &["Posting Location", "Location:"];

/// Links whose path or title carries these words lead to portal chrome, not jobs.
pub(crate) const NAVIGATION_KEYWORDS: &[&str] =
    &["sitemap", "sign-in", "profile", "account", "help", "about"];
