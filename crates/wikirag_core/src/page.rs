use std::fmt;

pub const NS_MAIN: i32 = 0;
pub const NS_TALK: i32 = 1;
pub const NS_USER: i32 = 2;
pub const NS_PROJECT: i32 = 4;
pub const NS_FILE: i32 = 6;
pub const NS_MEDIAWIKI: i32 = 8;
pub const NS_TEMPLATE: i32 = 10;
pub const NS_HELP: i32 = 12;
pub const NS_CATEGORY: i32 = 14;

/// Reserved namespace used to queue corpus-wide (context) providers.
pub const CONTEXT_NAMESPACE: i32 = 9999;
/// Title key of the context marker.
pub const CONTEXT_TITLE: &str = "__CONTEXT__";

const CANONICAL_NAMESPACES: &[(i32, &str)] = &[
    (NS_MAIN, ""),
    (NS_TALK, "Talk"),
    (NS_USER, "User"),
    (3, "User_talk"),
    (NS_PROJECT, "Project"),
    (5, "Project_talk"),
    (NS_FILE, "File"),
    (7, "File_talk"),
    (NS_MEDIAWIKI, "MediaWiki"),
    (9, "MediaWiki_talk"),
    (NS_TEMPLATE, "Template"),
    (11, "Template_talk"),
    (NS_HELP, "Help"),
    (13, "Help_talk"),
    (NS_CATEGORY, "Category"),
    (15, "Category_talk"),
];

/// Canonical (untranslated) name of a well-known namespace.
pub fn canonical_namespace_name(namespace: i32) -> Option<&'static str> {
    CANONICAL_NAMESPACES
        .iter()
        .find(|(id, _)| *id == namespace)
        .map(|(_, name)| *name)
}

/// Reverse of [`canonical_namespace_name`]; case-insensitive, spaces allowed.
pub fn namespace_from_name(name: &str) -> Option<i32> {
    let wanted = name.trim().replace(' ', "_");
    CANONICAL_NAMESPACES
        .iter()
        .find(|(_, candidate)| candidate.eq_ignore_ascii_case(&wanted))
        .map(|(id, _)| *id)
}

/// Normalize a title into its key form: trimmed, underscores for spaces,
/// first letter upper-cased.
pub fn normalize_title(title: &str) -> String {
    let underscored = title.trim().replace(' ', "_");
    let trimmed = underscored.trim_matches('_');
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether a normalized title key may name a page.
///
/// `|` is excluded as well, which keeps resource id bases splittable.
pub fn is_valid_title(title: &str) -> bool {
    !title.is_empty()
        && title.len() <= 255
        && !title
            .chars()
            .any(|c| matches!(c, '#' | '<' | '>' | '[' | ']' | '{' | '}' | '|') || c.is_control())
}

/// Reference to a page of the current wiki: namespace plus title key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageRef {
    namespace: i32,
    title: String,
}

impl PageRef {
    /// Build a reference, normalizing the title. Returns `None` for titles
    /// that cannot name a page.
    pub fn new(namespace: i32, title: &str) -> Option<Self> {
        let title = normalize_title(title);
        if !is_valid_title(&title) {
            return None;
        }
        Some(Self { namespace, title })
    }

    /// Parse `Namespace:Title` text; unknown prefixes stay part of a main
    /// namespace title.
    pub fn parse(text: &str) -> Option<Self> {
        if let Some((prefix, rest)) = text.split_once(':') {
            if let Some(namespace) = namespace_from_name(prefix) {
                if !prefix.trim().is_empty() {
                    return Self::new(namespace, rest);
                }
            }
            if prefix.trim().is_empty() {
                return Self::new(NS_MAIN, rest);
            }
        }
        Self::new(NS_MAIN, text)
    }

    /// The reserved reference under which context providers are queued.
    pub fn context_marker() -> Self {
        Self {
            namespace: CONTEXT_NAMESPACE,
            title: CONTEXT_TITLE.to_string(),
        }
    }

    pub fn is_context_marker(&self) -> bool {
        self.namespace == CONTEXT_NAMESPACE && self.title == CONTEXT_TITLE
    }

    pub fn namespace(&self) -> i32 {
        self.namespace
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Title with underscores shown as spaces.
    pub fn text(&self) -> String {
        self.title.replace('_', " ")
    }

    /// `namespace:title`, the key used for queue groups and drain results.
    pub fn queue_key(&self) -> String {
        format!("{}:{}", self.namespace, self.title)
    }

    /// Title of the parent page for `A/B/C` style subpages.
    pub fn base_page(&self) -> Option<PageRef> {
        let (base, _) = self.title.rsplit_once('/')?;
        PageRef::new(self.namespace, base)
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match canonical_namespace_name(self.namespace) {
            Some("") => write!(f, "{}", self.title),
            Some(name) => write!(f, "{name}:{}", self.title),
            None => write!(f, "{}:{}", self.namespace, self.title),
        }
    }
}

/// A resolved page handle: a reference plus whether the page currently exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    reference: PageRef,
    exists: bool,
}

impl Page {
    pub fn new(reference: PageRef, exists: bool) -> Self {
        Self { reference, exists }
    }

    pub fn reference(&self) -> &PageRef {
        &self.reference
    }

    pub fn namespace(&self) -> i32 {
        self.reference.namespace
    }

    pub fn title(&self) -> &str {
        &self.reference.title
    }

    pub fn exists(&self) -> bool {
        self.exists
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_titles() {
        assert_eq!(normalize_title(" some page "), "Some_page");
        assert_eq!(normalize_title("élan vital"), "Élan_vital");
        assert_eq!(normalize_title("   "), "");
    }

    #[test]
    fn rejects_invalid_titles() {
        assert!(PageRef::new(NS_MAIN, "").is_none());
        assert!(PageRef::new(NS_MAIN, "A|B").is_none());
        assert!(PageRef::new(NS_MAIN, "A[B]").is_none());
        assert!(PageRef::new(NS_MAIN, "Fine/Sub").is_some());
    }

    #[test]
    fn parses_prefixed_text() {
        let file = PageRef::parse("File:Report.pdf").unwrap();
        assert_eq!(file.namespace(), NS_FILE);
        assert_eq!(file.title(), "Report.pdf");

        let main = PageRef::parse("Unknown:Thing").unwrap();
        assert_eq!(main.namespace(), NS_MAIN);
        assert_eq!(main.title(), "Unknown:Thing");

        let help = PageRef::parse("help:Getting started").unwrap();
        assert_eq!(help.namespace(), NS_HELP);
        assert_eq!(help.title(), "Getting_started");
    }

    #[test]
    fn context_marker_is_recognized() {
        let marker = PageRef::context_marker();
        assert!(marker.is_context_marker());
        assert_eq!(marker.queue_key(), "9999:__CONTEXT__");
        assert!(!PageRef::new(NS_MAIN, "__CONTEXT__").unwrap().is_context_marker());
    }

    #[test]
    fn base_page_of_subpage() {
        let page = PageRef::new(NS_MAIN, "Guide/Install/Linux").unwrap();
        assert_eq!(page.base_page().unwrap().title(), "Guide/Install");
        assert!(PageRef::new(NS_MAIN, "Guide").unwrap().base_page().is_none());
    }
}
