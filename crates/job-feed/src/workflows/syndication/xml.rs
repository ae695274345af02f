use std::fmt::{self, Write as _};

use super::dates::{format_rfc822, parse_posted_date};
use super::FeedDocument;
use crate::workflows::listings::JobPosting;

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

pub(crate) fn write_rss<W: fmt::Write>(out: &mut W, document: &FeedDocument) -> fmt::Result {
    let metadata = &document.metadata;

    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<rss version="2.0" xmlns:atom="{ATOM_NAMESPACE}">"#)?;
    writeln!(out, "  <channel>")?;
    write_element(out, 4, "title", &metadata.title)?;
    write_element(out, 4, "link", metadata.link.as_str())?;
    write_element(out, 4, "description", &metadata.description)?;
    write_element(out, 4, "language", &metadata.language)?;
    if let Some(self_link) = &metadata.self_link {
        writeln!(
            out,
            r#"    <atom:link href="{}" rel="self" type="application/rss+xml"/>"#,
            escape_xml(self_link.as_str())
        )?;
    }
    write_element(out, 4, "lastBuildDate", &format_rfc822(document.last_build))?;

    for posting in &document.postings {
        write_item(out, posting)?;
    }

    writeln!(out, "  </channel>")?;
    writeln!(out, "</rss>")
}

fn write_item<W: fmt::Write>(out: &mut W, posting: &JobPosting) -> fmt::Result {
    writeln!(out, "    <item>")?;
    write_element(out, 6, "title", &posting.title)?;
    write_element(out, 6, "link", posting.url.as_str())?;
    write_element(out, 6, "description", &posting.summary())?;
    if let Some(department) = &posting.department {
        write_element(out, 6, "category", department)?;
    }
    writeln!(
        out,
        r#"      <guid isPermaLink="false">{}</guid>"#,
        escape_xml(posting.guid.as_str())
    )?;
    if let Some(published) = posting.posted_date.as_deref().and_then(parse_posted_date) {
        write_element(out, 6, "pubDate", &format_rfc822(published))?;
    }
    writeln!(out, "    </item>")
}

fn write_element<W: fmt::Write>(out: &mut W, indent: usize, name: &str, text: &str) -> fmt::Result {
    writeln!(
        out,
        "{:indent$}<{name}>{}</{name}>",
        "",
        escape_xml(text),
        indent = indent
    )
}

/// Escapes markup-significant characters and drops code points XML 1.0
/// cannot carry at all.
pub(crate) fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(c),
            c if (c as u32) < 0x20 => {}
            '\u{fffe}' | '\u{ffff}' => {}
            other => escaped.push(other),
        }
    }
    escaped
}
