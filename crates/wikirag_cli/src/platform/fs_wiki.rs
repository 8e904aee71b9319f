//! Directory-backed wiki: `<root>/<namespace id>/<Title>.wiki` holds the
//! current text of a page, `<root>/files/<Title>` the file behind a file page.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rag_logging::rag_warn;
use wikirag_core::{
    canonical_namespace_name, Page, PageRef, Revision, RevisionContent, NS_FILE,
};
use wikirag_engine::{
    FileInfo, HostError, RenderedPage, WikiHost, MEDIA_TYPE_OFFICE, MEDIA_TYPE_TEXT,
};

use super::markup;

const PAGE_EXTENSION: &str = "wiki";
const FILES_DIR: &str = "files";

pub struct FsWiki {
    root: PathBuf,
}

impl FsWiki {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn page_path(&self, page: &PageRef) -> Option<PathBuf> {
        if !is_path_safe(page.title()) {
            return None;
        }
        Some(
            self.root
                .join(page.namespace().to_string())
                .join(format!("{}.{PAGE_EXTENSION}", page.title())),
        )
    }

    fn file_path(&self, page: &PageRef) -> Option<PathBuf> {
        if page.namespace() != NS_FILE || !is_path_safe(page.title()) {
            return None;
        }
        Some(self.root.join(FILES_DIR).join(page.title()))
    }

    fn read_text(&self, page: &PageRef) -> Result<Option<String>, HostError> {
        let Some(path) = self.page_path(page) else {
            return Ok(None);
        };
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Namespaces with a directory under the root.
    fn namespaces(&self) -> Result<Vec<i32>, HostError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut namespaces = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(namespace) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
                namespaces.push(namespace);
            }
        }
        namespaces.sort_unstable();
        Ok(namespaces)
    }
}

/// No empty, `.` or `..` segments in a title used as a relative path.
fn is_path_safe(title: &str) -> bool {
    title
        .split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

fn collect_titles(dir: &Path, prefix: &str, titles: &mut Vec<String>) -> io::Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    for entry in entries {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_titles(&path, &format!("{prefix}{name}/"), titles)?;
        } else if let Some(stem) = name.strip_suffix(&format!(".{PAGE_EXTENSION}")) {
            titles.push(format!("{prefix}{stem}"));
        }
    }
    Ok(())
}

fn media_type(extension: &str) -> (&'static str, &'static str) {
    match extension {
        "txt" => (MEDIA_TYPE_TEXT, "text/plain"),
        "md" => (MEDIA_TYPE_TEXT, "text/markdown"),
        "csv" => (MEDIA_TYPE_TEXT, "text/csv"),
        "json" => (MEDIA_TYPE_TEXT, "application/json"),
        "xml" => (MEDIA_TYPE_TEXT, "application/xml"),
        "pdf" => (MEDIA_TYPE_OFFICE, "application/pdf"),
        "doc" => (MEDIA_TYPE_OFFICE, "application/msword"),
        "docx" => (
            MEDIA_TYPE_OFFICE,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        "xlsx" => (
            MEDIA_TYPE_OFFICE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
        "pptx" => (
            MEDIA_TYPE_OFFICE,
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ),
        "odt" => (MEDIA_TYPE_OFFICE, "application/vnd.oasis.opendocument.text"),
        "png" => ("BITMAP", "image/png"),
        "jpg" | "jpeg" => ("BITMAP", "image/jpeg"),
        "gif" => ("BITMAP", "image/gif"),
        "svg" => ("DRAWING", "image/svg+xml"),
        _ => ("UNKNOWN", "application/octet-stream"),
    }
}

impl WikiHost for FsWiki {
    fn resolve_page(&self, namespace: i32, title: &str) -> Option<Page> {
        let reference = PageRef::new(namespace, title)?;
        let exists = self
            .page_path(&reference)
            .is_some_and(|path| path.is_file());
        Some(Page::new(reference, exists))
    }

    fn list_pages(&self, namespaces: &[i32]) -> Result<Vec<PageRef>, HostError> {
        let mut pages = Vec::new();
        for &namespace in namespaces {
            let mut titles = Vec::new();
            collect_titles(&self.root.join(namespace.to_string()), "", &mut titles)?;
            titles.sort();
            for title in titles {
                match PageRef::new(namespace, &title) {
                    Some(reference) if reference.title() == title => pages.push(reference),
                    _ => rag_warn!("Ignoring page file with invalid title {namespace}:{title}"),
                }
            }
        }
        Ok(pages)
    }

    fn current_revision(&self, page: &Page) -> Result<Option<Revision>, HostError> {
        let Some(path) = self.page_path(page.reference()) else {
            return Ok(None);
        };
        let Some(text) = self.read_text(page.reference())? else {
            return Ok(None);
        };
        let modified: DateTime<Utc> = fs::metadata(&path)?.modified()?.into();
        Ok(Some(Revision {
            page: page.clone(),
            id: Some(u64::try_from(modified.timestamp()).unwrap_or_default()),
            timestamp: Some(modified),
            is_current: true,
            content: Some(RevisionContent::wikitext(text)),
        }))
    }

    fn render(&self, revision: &Revision) -> Result<RenderedPage, HostError> {
        let text = revision
            .content
            .as_ref()
            .map(|content| content.text.as_str())
            .unwrap_or_default();
        Ok(RenderedPage {
            html: markup::to_html(text),
            categories: markup::categories(text),
            templates: markup::templates(text),
            sections: markup::sections(text),
            properties: markup::page_properties(text),
        })
    }

    fn namespace_text(&self, namespace: i32) -> String {
        canonical_namespace_name(namespace)
            .map(|name| name.replace('_', " "))
            .unwrap_or_else(|| namespace.to_string())
    }

    fn file_for_page(&self, page: &PageRef) -> Result<Option<FileInfo>, HostError> {
        let Some(path) = self.file_path(page) else {
            return Ok(None);
        };
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let extension = page
            .title()
            .rsplit_once('.')
            .map(|(_, extension)| extension.to_ascii_lowercase())
            .unwrap_or_default();
        let (media_type, mime_type) = media_type(&extension);
        Ok(Some(FileInfo {
            extension,
            media_type: media_type.to_string(),
            mime_type: mime_type.to_string(),
            bytes,
        }))
    }

    fn redirect_target(&self, page: &PageRef) -> Result<Option<PageRef>, HostError> {
        Ok(self
            .read_text(page)?
            .and_then(|text| markup::redirect_target(&text)))
    }

    fn outgoing_links(&self, page: &PageRef) -> Result<Vec<PageRef>, HostError> {
        Ok(self
            .read_text(page)?
            .map(|text| markup::page_links(&text))
            .unwrap_or_default())
    }

    fn incoming_link_count(&self, page: &PageRef) -> Result<usize, HostError> {
        let mut count = 0;
        for source in self.list_pages(&self.namespaces()?)? {
            if &source == page {
                continue;
            }
            if self.outgoing_links(&source)?.contains(page) {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use wikirag_core::NS_MAIN;

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn wiki() -> (TempDir, FsWiki) {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "0/Guide.wiki", b"== Intro ==\nSee [[Guide/Install]].");
        write(temp.path(), "0/Guide/Install.wiki", b"Back to [[Guide]].");
        write(temp.path(), "0/Old.wiki", b"#REDIRECT [[Guide]]");
        write(temp.path(), "6/Notes.txt.wiki", b"Meeting notes");
        write(temp.path(), "files/Notes.txt", b"plain notes");
        let wiki = FsWiki::new(temp.path());
        (temp, wiki)
    }

    #[test]
    fn lists_pages_including_subpages() {
        let (_temp, wiki) = wiki();

        let titles: Vec<String> = wiki
            .list_pages(&[NS_MAIN, NS_FILE])
            .unwrap()
            .iter()
            .map(|page| page.to_string())
            .collect();

        assert_eq!(titles, vec!["Guide", "Guide/Install", "Old", "File:Notes.txt"]);
    }

    #[test]
    fn resolves_existing_and_missing_pages() {
        let (_temp, wiki) = wiki();

        assert!(wiki.resolve_page(NS_MAIN, "Guide").unwrap().exists());
        assert!(!wiki.resolve_page(NS_MAIN, "Missing").unwrap().exists());
        assert!(!wiki.resolve_page(NS_MAIN, "../escape").unwrap().exists());
        assert!(wiki.resolve_page(NS_MAIN, "a|b").is_none());
    }

    #[test]
    fn reads_revisions_and_renders() {
        let (_temp, wiki) = wiki();
        let page = wiki.resolve_page(NS_MAIN, "Guide").unwrap();

        let revision = wiki.current_revision(&page).unwrap().unwrap();
        assert!(revision.content.as_ref().unwrap().is_wikitext());
        let rendered = wiki.render(&revision).unwrap();
        assert_eq!(rendered.sections, vec!["Intro"]);
        assert!(rendered.html.starts_with("<h2>Intro</h2>"));
    }

    #[test]
    fn finds_files_links_and_redirects() {
        let (_temp, wiki) = wiki();
        let notes = PageRef::new(NS_FILE, "Notes.txt").unwrap();
        let guide = PageRef::new(NS_MAIN, "Guide").unwrap();
        let old = PageRef::new(NS_MAIN, "Old").unwrap();

        let file = wiki.file_for_page(&notes).unwrap().unwrap();
        assert_eq!(file.extension, "txt");
        assert_eq!(file.media_type, MEDIA_TYPE_TEXT);
        assert_eq!(file.bytes, b"plain notes");

        assert_eq!(wiki.redirect_target(&old).unwrap(), Some(guide.clone()));
        assert_eq!(wiki.incoming_link_count(&guide).unwrap(), 2);
    }
}
