//! Just enough wikitext parsing for the directory-backed host.

use std::collections::BTreeMap;

use wikirag_core::{PageRef, NS_CATEGORY, NS_FILE};

/// Magic word that marks a page as excluded from retrieval.
const NO_RAG_MAGIC_WORD: &str = "__NO_RAG__";
pub const NO_RAG_PROPERTY: &str = "NO_RAG";

/// Target of `#REDIRECT [[Target]]` on the first line.
pub fn redirect_target(text: &str) -> Option<PageRef> {
    let first = text.lines().next()?.trim_start();
    let prefix = first.get(..9)?;
    if !prefix.eq_ignore_ascii_case("#REDIRECT") {
        return None;
    }
    links(&first[9..]).into_iter().next()
}

/// Targets of `[[...]]` links, labels and anchors stripped, in order.
pub fn links(text: &str) -> Vec<PageRef> {
    delimited(text, "[[", "]]")
        .filter_map(|inner| {
            let target = inner.split('|').next().unwrap_or_default();
            let target = target.split('#').next().unwrap_or_default();
            PageRef::parse(target.trim_start_matches(':'))
        })
        .collect()
}

/// Links to ordinary pages; category tags and embedded files are not links.
pub fn page_links(text: &str) -> Vec<PageRef> {
    links(text)
        .into_iter()
        .filter(|link| link.namespace() != NS_CATEGORY && link.namespace() != NS_FILE)
        .collect()
}

pub fn categories(text: &str) -> Vec<String> {
    links(text)
        .into_iter()
        .filter(|link| link.namespace() == NS_CATEGORY)
        .map(|link| link.title().to_string())
        .collect()
}

/// Names of `{{Template}}` inclusions, parameters stripped.
pub fn templates(text: &str) -> Vec<String> {
    delimited(text, "{{", "}}")
        .filter_map(|inner| {
            let name = inner.split('|').next().unwrap_or_default().trim();
            (!name.is_empty()).then(|| format!("Template:{name}"))
        })
        .collect()
}

/// Headings of `== Section ==` lines.
pub fn sections(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.len() < 4 || !line.starts_with("==") || !line.ends_with("==") {
                return None;
            }
            let heading = line.trim_matches('=').trim();
            (!heading.is_empty()).then(|| heading.to_string())
        })
        .collect()
}

pub fn page_properties(text: &str) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    if text.contains(NO_RAG_MAGIC_WORD) {
        properties.insert(NO_RAG_PROPERTY.to_string(), String::new());
    }
    properties
}

/// Paragraphs as escaped `<p>` elements, headings as `<h2>`.
pub fn to_html(text: &str) -> String {
    let mut html = String::new();
    for block in text.split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        if block.starts_with("==") && block.ends_with("==") && !block.contains('\n') {
            html.push_str(&format!("<h2>{}</h2>\n", escape(block.trim_matches('=').trim())));
        } else {
            html.push_str(&format!("<p>{}</p>\n", escape(block)));
        }
    }
    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn delimited<'a>(
    text: &'a str,
    open: &'a str,
    close: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    let mut rest = text;
    std::iter::from_fn(move || {
        let start = rest.find(open)? + open.len();
        let end = rest[start..].find(close)? + start;
        let inner = &rest[start..end];
        rest = &rest[end + close.len()..];
        Some(inner)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wikirag_core::NS_MAIN;

    #[test]
    fn finds_links_and_categories() {
        let text = "See [[Guide/Install|the guide]], [[Help:Start#Top]] and \
                    [[File:Logo.png]].\n[[Category:Manuals]]";

        let titles: Vec<String> = page_links(text).iter().map(|l| l.to_string()).collect();
        assert_eq!(titles, vec!["Guide/Install", "Help:Start"]);
        assert_eq!(categories(text), vec!["Manuals"]);
    }

    #[test]
    fn detects_redirects() {
        let target = redirect_target("#redirect [[New page]]\n").unwrap();
        assert_eq!(target.namespace(), NS_MAIN);
        assert_eq!(target.title(), "New_page");
        assert!(redirect_target("Plain text [[Other]]").is_none());
    }

    #[test]
    fn collects_templates_sections_and_properties() {
        let text = "{{Infobox|a=1}}\n== Intro ==\ntext\n=== Details ===\n__NO_RAG__";

        assert_eq!(templates(text), vec!["Template:Infobox"]);
        assert_eq!(sections(text), vec!["Intro", "Details"]);
        assert!(page_properties(text).contains_key(NO_RAG_PROPERTY));
    }

    #[test]
    fn renders_escaped_paragraphs() {
        assert_eq!(
            to_html("== Intro ==\n\na < b"),
            "<h2>Intro</h2>\n<p>a &lt; b</p>\n"
        );
    }
}
