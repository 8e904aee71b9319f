mod common;

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use common::{keys, Harness, MemoryWiki, WIKI_ID};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wikirag_core::{Page, Revision};
use wikirag_engine::{
    AclProvider, ContextProvider, DataProvider, HookRegistry, MetadataHook, RagWikitextProvider,
    TextFilter, WikiHost, MEDIA_TYPE_TEXT,
};

fn current_revision(wiki: &MemoryWiki, title: &str) -> Revision {
    let page = wiki.page(title);
    wiki.current_revision(&page).unwrap().unwrap()
}

fn metadata_of(harness: &Harness, title: &str) -> Value {
    let provider = harness.services.catalog.get_data_provider("metadata").unwrap();
    let revision = current_revision(&harness.wiki, title);
    serde_json::from_slice(&provider.provide_for_revision(&revision).unwrap()).unwrap()
}

#[test]
fn metadata_describes_the_page() {
    let harness = Harness::new(&["metadata"]);
    harness.wiki.put("Guide", "parent");
    harness.wiki.put("Guide/Install", "child");

    let meta = metadata_of(&harness, "Guide/Install");

    assert_eq!(meta["wiki_id"], json!(WIKI_ID));
    assert_eq!(meta["title"], json!("Guide/Install"));
    assert_eq!(meta["namespace_text"], json!(""));
    assert_eq!(meta["url"], json!("Special:PermanentLink/2"));
    assert_eq!(meta["modification-date"], json!("20240501120000"));
    assert_eq!(meta["creation-date"], json!("20240501120000"));
    assert_eq!(meta["subpage-of"], json!(format!("{WIKI_ID}|0|Guide")));
    assert_eq!(meta["is-redirect"], json!(false));
    assert_eq!(meta["redirect_target"], json!(""));
    assert_eq!(meta["noindex"], json!(false));
    assert_eq!(meta["linked_pages"], json!([]));
    assert!(meta.get("is_file").is_none());
}

#[test]
fn metadata_of_file_pages_carries_file_details() {
    let harness = Harness::new(&["metadata"]);
    harness
        .wiki
        .put_file("File:Notes.txt", "txt", MEDIA_TYPE_TEXT, b"notes");

    let meta = metadata_of(&harness, "File:Notes.txt");

    assert_eq!(meta["title"], json!("File:Notes.txt"));
    assert_eq!(meta["is_file"], json!(true));
    assert_eq!(meta["extension"], json!("txt"));
    assert_eq!(meta["subpage-of"], Value::Null);
}

struct Audience;

impl MetadataHook for Audience {
    fn on_metadata(
        &self,
        _page: &Page,
        _revision: &Revision,
        meta: &mut serde_json::Map<String, Value>,
    ) {
        meta.insert("audience".into(), json!("internal"));
    }
}

#[test]
fn metadata_hooks_run_last() {
    let wiki = MemoryWiki::new();
    wiki.put("Guide", "text");
    let mut hooks = HookRegistry::new();
    hooks.add_metadata(Arc::new(Audience));
    let hooks = Arc::new(hooks);
    let host: Arc<dyn WikiHost> = wiki.clone();
    let provider = wikirag_engine::MetadataProvider::new(
        host.clone(),
        wikirag_core::ResourceIdentity::new(WIKI_ID),
        Arc::new(wikirag_engine::NamespaceIndexability::new(host, hooks.clone())),
        hooks,
    );

    let bytes = provider
        .provide_for_revision(&current_revision(&wiki, "Guide"))
        .unwrap();
    let meta: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(meta["audience"], json!("internal"));
}

#[test]
fn acl_lists_groups_with_read() {
    let mut permissions = BTreeMap::new();
    permissions.insert(
        "user".to_string(),
        BTreeMap::from([("read".to_string(), true), ("edit".to_string(), true)]),
    );
    permissions.insert(
        "*".to_string(),
        BTreeMap::from([("read".to_string(), false)]),
    );
    permissions.insert(
        "sysop".to_string(),
        BTreeMap::from([("read".to_string(), true)]),
    );
    let provider = AclProvider::new(permissions);
    let wiki = MemoryWiki::new();
    wiki.put("Guide", "text");

    let bytes = provider
        .provide_for_revision(&current_revision(&wiki, "Guide"))
        .unwrap();

    assert_eq!(String::from_utf8(bytes).unwrap(), r#"["sysop","user"]"#);
}

#[test]
fn file_artifact_uses_the_attachment_extension() {
    let harness = Harness::new(&["file"]);
    harness
        .wiki
        .put_file("File:Notes.txt", "txt", MEDIA_TYPE_TEXT, b"plain notes");
    harness.wiki.put("Guide", "text");

    let file_page = harness.wiki.page("File:Notes.txt");
    let status = harness
        .services
        .runner
        .run_for_page(&file_page, &keys(&["file"]))
        .unwrap()
        .unwrap();
    assert_eq!(status.success(), keys(&["file"]).as_slice());
    assert_eq!(
        fs::read(harness.artifact_path("File:Notes.txt", "attachment.txt")).unwrap(),
        b"plain notes"
    );

    let page = harness.wiki.page("Guide");
    let status = harness
        .services
        .runner
        .run_for_page(&page, &keys(&["file"]))
        .unwrap()
        .unwrap();
    assert_eq!(status.skipped(), keys(&["file"]).as_slice());
}

struct Shouting;

impl TextFilter for Shouting {
    fn filter(&self, wikitext: &str) -> String {
        wikitext.replace("'''", "").to_uppercase()
    }
}

#[test]
fn rag_wikitext_passes_through_the_filter() {
    let wiki = MemoryWiki::new();
    wiki.put("Guide", "'''bold''' words");
    let provider = RagWikitextProvider::new(wiki.clone(), Arc::new(Shouting));
    let page = wiki.page("Guide");

    assert!(provider.can_provide_for_page(&page).unwrap());
    let bytes = provider
        .provide_for_revision(&current_revision(&wiki, "Guide"))
        .unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), "BOLD WORDS");
}

#[test]
fn wiki_structure_nests_indexable_pages() {
    let harness = Harness::new(&["wikitext"]);
    harness.wiki.put("Guide", "a");
    harness.wiki.put("Guide/Install", "b");
    harness.wiki.put("User:Alice", "not indexable");
    harness
        .wiki
        .put_file("File:Notes.txt", "txt", MEDIA_TYPE_TEXT, b"notes");

    let provider = harness
        .services
        .catalog
        .get_context_provider("wiki-structure")
        .unwrap()
        .unwrap();
    let document: Value = serde_json::from_slice(&provider.provide().unwrap()).unwrap();

    assert_eq!(provider.extension(), "json");
    assert_eq!(
        document,
        json!({
            "wiki_id": WIKI_ID,
            "pages": {
                ":Guide": { "Install": {} },
                "File:Notes.txt": {}
            },
            "namespaces": { "0": "", "6": "File" }
        })
    );
}

#[test]
fn analyze_prompt_prefers_the_prompt_page() {
    let harness = Harness::new(&["wikitext"]);
    let provider = harness
        .services
        .catalog
        .get_context_provider("analyze")
        .unwrap()
        .unwrap();
    assert_eq!(
        String::from_utf8(provider.provide().unwrap()).unwrap(),
        wikirag_engine::DEFAULT_ANALYZER_PROMPT
    );

    harness
        .wiki
        .put("MediaWiki:Wikirag-prompt-analyzer", "Summarize every page.");
    assert_eq!(
        String::from_utf8(provider.provide().unwrap()).unwrap(),
        "Summarize every page."
    );
}
