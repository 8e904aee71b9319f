use std::fmt::Write as _;

use sha1::{Digest, Sha1};

use crate::page::PageRef;

const ID_DELIMITER: char = '|';

/// Extension of the whole-instance marker resource removed before a full reindex.
pub const PURGE_EXTENSION: &str = "purge";

/// Maps pages of one wiki instance to stable artifact identifiers.
///
/// The id base is `wikiId|namespace|titleKey`; the resource id is the hex
/// SHA-1 of the base and serves as the artifact filename stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    wiki_id: String,
}

impl ResourceIdentity {
    pub fn new(wiki_id: impl Into<String>) -> Self {
        Self {
            wiki_id: wiki_id.into(),
        }
    }

    pub fn wiki_id(&self) -> &str {
        &self.wiki_id
    }

    pub fn id_base(&self, page: &PageRef) -> String {
        format!(
            "{wiki}{d}{ns}{d}{title}",
            wiki = self.wiki_id,
            ns = page.namespace(),
            title = page.title(),
            d = ID_DELIMITER
        )
    }

    pub fn resource_id(&self, page: &PageRef) -> String {
        sha1_hex(&self.id_base(page))
    }

    /// Recover the page from an id base produced by this instance.
    ///
    /// Fails for foreign wiki ids, for strings that do not split into exactly
    /// three components, and for components that do not form a valid page.
    pub fn page_ref_from_id_base(&self, id_base: &str) -> Option<PageRef> {
        let parts: Vec<&str> = id_base.split(ID_DELIMITER).collect();
        let [wiki_id, namespace, title] = parts.as_slice() else {
            return None;
        };
        if *wiki_id != self.wiki_id {
            return None;
        }
        let namespace = namespace.parse::<i32>().ok()?;
        PageRef::new(namespace, title)
    }

    /// Resource id of a corpus-wide context artifact.
    pub fn context_resource_id(&self, provider_key: &str) -> String {
        format!("{}.context.{provider_key}", self.wiki_id)
    }

    /// Marker resource standing for "everything exported for this wiki".
    pub fn purge_marker(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(self.wiki_id.clone(), PURGE_EXTENSION, Vec::new())
    }
}

fn sha1_hex(input: &str) -> String {
    let digest = Sha1::digest(input.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

/// True when `name` can be used verbatim as a file name on common platforms.
pub fn is_filesystem_safe(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(is_forbidden)
        && !name.ends_with(&['.', ' '][..])
        && !is_reserved_windows_name(name.split('.').next().unwrap_or(name))
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// One artifact to write or remove: `{resource_id}.{extension}` plus its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    resource_id: String,
    extension: String,
    content: Vec<u8>,
}

impl ResourceDescriptor {
    pub fn new(
        resource_id: impl Into<String>,
        extension: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            extension: extension.into(),
            content: content.into(),
        }
    }

    /// Descriptor without content, as used for removals.
    pub fn empty(resource_id: impl Into<String>, extension: impl Into<String>) -> Self {
        Self::new(resource_id, extension, Vec::new())
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.resource_id, self.extension)
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_lossy(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}
