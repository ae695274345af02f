use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::domain::JobPosting;
use super::normalizer::{normalize_optional, normalize_text, resolve_link, strip_date_label};
use super::selectors::{ListingSelectors, DETAIL_LOCATION_LABELS, LOCATION_HINTS, NAVIGATION_KEYWORDS};
use super::ExtractionError;

#[derive(Debug)]
pub(crate) struct CompiledSelectors {
    pub(crate) listings: Selector,
    pub(crate) card: Selector,
    title: Selector,
    link: Selector,
    location: Selector,
    department: Selector,
    posted_date: Selector,
    detail_title: Selector,
}

impl CompiledSelectors {
    pub(crate) fn compile(selectors: &ListingSelectors) -> Result<Self, ExtractionError> {
        Ok(Self {
            listings: compile("listings", &selectors.listings)?,
            card: compile("card", &selectors.card)?,
            title: compile("title", &selectors.title)?,
            link: compile("link", &selectors.link)?,
            location: compile("location", &selectors.location)?,
            department: compile("department", &selectors.department)?,
            posted_date: compile("posted_date", &selectors.posted_date)?,
            detail_title: compile("detail_title", &selectors.detail_title)?,
        })
    }
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|err| ExtractionError::InvalidSelector {
        field,
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkipReason {
    MissingLink,
    MissingTitle,
}

#[derive(Debug)]
pub(crate) enum CardOutcome {
    Posting(JobPosting),
    Navigation(Url),
    Skipped(SkipReason),
}

/// Cards in document order that sit inside a listings container.
pub(crate) fn job_cards<'a>(
    document: &'a Html,
    selectors: &'a CompiledSelectors,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    document.select(&selectors.card).filter(|card| {
        card.ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| selectors.listings.matches(&ancestor))
    })
}

pub(crate) fn read_card(
    card: ElementRef<'_>,
    selectors: &CompiledSelectors,
    base_url: &Url,
) -> CardOutcome {
    let anchor = card_anchor(card, &selectors.link);
    let Some(url) = anchor
        .and_then(|anchor| anchor.value().attr("href"))
        .and_then(|href| resolve_link(base_url, href))
    else {
        return CardOutcome::Skipped(SkipReason::MissingLink);
    };

    let title = first_text(card, &selectors.title)
        .or_else(|| anchor.and_then(|anchor| normalize_optional(&element_text(anchor))));
    let Some(title) = title else {
        return CardOutcome::Skipped(SkipReason::MissingTitle);
    };

    if is_navigation(&url, &title) {
        return CardOutcome::Navigation(url);
    }

    let location = first_text(card, &selectors.location).or_else(|| location_hint(card));
    let department = first_text(card, &selectors.department);
    let posted_date = card
        .select(&selectors.posted_date)
        .find_map(|element| {
            element
                .value()
                .attr("datetime")
                .and_then(strip_date_label)
                .or_else(|| strip_date_label(&element_text(element)))
        });

    match JobPosting::new(title, url) {
        Some(posting) => CardOutcome::Posting(
            posting
                .with_location(location)
                .with_department(department)
                .with_posted_date(posted_date),
        ),
        None => CardOutcome::Skipped(SkipReason::MissingTitle),
    }
}

/// Fields recovered from a job's own page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub title: Option<String>,
    pub location: Option<String>,
}

pub(crate) fn read_detail(html: &str, selectors: &CompiledSelectors) -> DetailFields {
    let document = Html::parse_document(html);
    let title = document
        .select(&selectors.detail_title)
        .find_map(|element| normalize_optional(&element_text(element)));

    let location = document
        .root_element()
        .descendants()
        .filter(|node| {
            node.value()
                .as_text()
                .is_some_and(|text| DETAIL_LOCATION_LABELS.iter().any(|label| text.contains(label)))
        })
        .find_map(|node| {
            let parent = node.parent().and_then(ElementRef::wrap)?;
            let mut text = normalize_text(&element_text(parent));
            for label in DETAIL_LOCATION_LABELS {
                text = text.replace(label, "");
            }
            normalize_optional(text.trim_start_matches([':', ' ']))
        });

    DetailFields { title, location }
}

fn card_anchor<'a>(card: ElementRef<'a>, link: &Selector) -> Option<ElementRef<'a>> {
    if card.value().name() == "a" && card.value().attr("href").is_some() {
        return Some(card);
    }
    card.select(link).next()
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .find_map(|element| normalize_optional(&element_text(element)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn location_hint(card: ElementRef<'_>) -> Option<String> {
    card.text()
        .map(normalize_text)
        .find(|text| LOCATION_HINTS.iter().any(|hint| text.contains(hint)))
}

/// A keyword must fill a whole path segment or a dash-separated part of one,
/// so `/my-profile` counts while `/job/77/accountant` does not.
fn is_navigation(url: &Url, title: &str) -> bool {
    let slug = title.to_ascii_lowercase().replace(' ', "-");
    let segments: Vec<String> = url
        .path_segments()
        .map(|segments| segments.map(str::to_ascii_lowercase).collect())
        .unwrap_or_default();

    NAVIGATION_KEYWORDS.iter().any(|keyword| {
        slug == *keyword
            || segments
                .iter()
                .any(|segment| segment_names(segment, keyword))
    })
}

fn segment_names(segment: &str, keyword: &str) -> bool {
    segment == keyword
        || segment
            .strip_prefix(keyword)
            .is_some_and(|rest| rest.starts_with('-'))
        || segment
            .strip_suffix(keyword)
            .is_some_and(|rest| rest.ends_with('-'))
}
