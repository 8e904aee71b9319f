mod common;

use common::{keys, Harness};
use pretty_assertions::assert_eq;
use wikirag_engine::{PageEvent, MEDIA_TYPE_TEXT};

#[test]
fn created_page_refreshes_the_wiki_structure() {
    let harness = Harness::new(&["wikitext"]);
    harness.wiki.put("Guide", "text");
    let page = harness.wiki.page("Guide");

    harness
        .services
        .notify(&PageEvent::Saved {
            page,
            created: true,
        })
        .unwrap();

    assert_eq!(
        harness.queued(),
        vec![
            ("0:Guide".to_string(), keys(&["wikitext", "id"])),
            ("9999:__CONTEXT__".to_string(), keys(&["wiki-structure"])),
        ]
    );
}

#[test]
fn move_with_redirect_exports_both_pages() {
    let harness = Harness::new(&["wikitext"]);
    harness.wiki.put("Old", "#REDIRECT [[New]]");
    harness.wiki.put("New", "text");
    let old = harness.wiki.page("Old");
    let new = harness.wiki.page("New");

    harness
        .services
        .notify(&PageEvent::Moved {
            old,
            new,
            redirect_left: true,
        })
        .unwrap();

    let queued = harness.queued();
    assert_eq!(queued[0], ("0:Old".to_string(), keys(&["wikitext", "id"])));
    assert_eq!(queued[1], ("0:New".to_string(), keys(&["wikitext", "id"])));
}

#[test]
fn move_without_redirect_deletes_the_old_page() {
    let harness = Harness::new(&["wikitext"]);
    harness.wiki.put("New", "text");
    let old = harness.wiki.page("Old");
    let new = harness.wiki.page("New");

    harness
        .services
        .notify(&PageEvent::Moved {
            old,
            new,
            redirect_left: false,
        })
        .unwrap();

    let queued = harness.queued();
    assert_eq!(queued[0], ("0:New".to_string(), keys(&["wikitext", "id"])));
    assert_eq!(queued[1], ("0:Old".to_string(), keys(&["id", "deleted"])));
}

#[test]
fn upload_schedules_the_file_pipeline() {
    let harness = Harness::new(&["wikitext", "file"]);
    harness
        .wiki
        .put_file("File:Notes.txt", "txt", MEDIA_TYPE_TEXT, b"notes");
    let page = harness.wiki.page("File:Notes.txt");

    harness
        .services
        .notify(&PageEvent::FileUploaded { page })
        .unwrap();

    assert_eq!(
        harness.queued(),
        vec![("6:Notes.txt".to_string(), keys(&["file", "id"]))]
    );
}

#[test]
fn saving_the_prompt_page_refreshes_the_prompt() {
    let harness = Harness::new(&["wikitext"]);
    harness
        .wiki
        .put("MediaWiki:Wikirag-prompt-analyzer", "Be brief.");
    let page = harness.wiki.page("MediaWiki:Wikirag-prompt-analyzer");

    harness
        .services
        .notify(&PageEvent::Saved {
            page,
            created: false,
        })
        .unwrap();

    assert_eq!(
        harness.queued(),
        vec![("9999:__CONTEXT__".to_string(), keys(&["analyze"]))]
    );
}

#[test]
fn restored_page_is_exported_again() {
    let harness = Harness::new(&["wikitext"]);
    harness.wiki.put("Guide", "restored");
    let page = harness.wiki.page("Guide");

    harness
        .services
        .notify(&PageEvent::Undeleted { page })
        .unwrap();

    let queued = harness.queued();
    assert_eq!(queued[0], ("0:Guide".to_string(), keys(&["wikitext", "id"])));
    assert_eq!(
        queued[1],
        ("9999:__CONTEXT__".to_string(), keys(&["wiki-structure"]))
    );
}
