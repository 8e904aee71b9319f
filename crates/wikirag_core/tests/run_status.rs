use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use wikirag_core::{PageRef, ResourceDescriptor, RunStatus, NS_MAIN};

fn status() -> RunStatus {
    RunStatus::new(PageRef::new(NS_MAIN, "Page").unwrap())
}

#[test]
fn accumulates_outcomes_per_provider() {
    let mut status = status();
    status.record_success("id", ResourceDescriptor::new("abc", "id", b"w|0|Page".to_vec()));
    status.record_skipped("deleted");
    status.record_failure("html", "render failed");

    assert_eq!(status.success(), ["id".to_string()]);
    assert_eq!(status.skipped(), ["deleted".to_string()]);
    assert_eq!(
        status.failed(),
        [("html".to_string(), "render failed".to_string())]
    );
    assert_eq!(status.written().len(), 1);
    assert_eq!(status.written()[0].file_name(), "abc.id");
}

#[test]
fn touched_providers_is_the_union() {
    let mut status = status();
    status.record_success("id", ResourceDescriptor::empty("abc", "id"));
    status.record_skipped("deleted");
    status.record_failure("html", "boom");
    assert_eq!(status.touched_providers(), vec!["deleted", "html", "id"]);
}

#[test]
fn repeated_failure_keeps_latest_message() {
    let mut status = status();
    status.record_failure("html", "first");
    status.record_failure("html", "second");
    assert_eq!(status.failed(), [("html".to_string(), "second".to_string())]);
}

#[test]
fn finish_stamps_timestamp() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let status = status();
    assert_eq!(status.timestamp(), None);
    let finished = status.finish(at);
    assert_eq!(finished.timestamp(), Some(at));
}
