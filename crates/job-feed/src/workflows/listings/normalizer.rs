use url::Url;

const DATE_PREFIXES: &[&str] = &["posting date", "date posted", "posted on", "posted"];

/// Collapses whitespace runs, trims both ends and drops invisible characters
/// that portals like to leave around labels.
pub(crate) fn normalize_text(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}', '\u{200c}', '\u{200d}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn normalize_optional(value: &str) -> Option<String> {
    let normalized = normalize_text(value);
    (!normalized.is_empty()).then_some(normalized)
}

/// Resolves an `href` against the portal base. Only http(s) targets count as
/// job links.
pub(crate) fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}

/// Form used for identity: no fragment, no trailing slash on non-root paths.
/// Host case is already folded by the URL parser.
pub(crate) fn canonical_url(url: &Url) -> String {
    let mut canonical = url.clone();
    canonical.set_fragment(None);

    let path = canonical.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        canonical.set_path(path.trim_end_matches('/'));
    }

    canonical.to_string()
}

/// Removes labels such as "Posted" or "Posting Date:" from a date string.
pub(crate) fn strip_date_label(value: &str) -> Option<String> {
    let normalized = normalize_text(value);
    let lowered = normalized.to_ascii_lowercase();

    let stripped = DATE_PREFIXES
        .iter()
        .find(|prefix| lowered.starts_with(*prefix))
        .map(|prefix| normalized[prefix.len()..].trim_start_matches([':', ' ', '-']))
        .unwrap_or(&normalized);

    normalize_optional(stripped)
}
