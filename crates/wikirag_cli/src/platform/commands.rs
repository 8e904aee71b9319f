use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use rag_logging::{rag_info, rag_warn};
use wikirag_core::{Page, PageRef, RunStatus};
use wikirag_engine::{ExportServices, PageEvent, QueueStore, ServiceOptions, WikiHost};

use super::fs_wiki::FsWiki;
use super::settings::CliSettings;
use super::table::Table;

/// Platform events accepted by `notify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventKind {
    Saved,
    Created,
    Deleted,
    Undeleted,
    Uploaded,
    Moved,
}

pub fn build_services(settings: &CliSettings) -> Result<ExportServices> {
    let host: Arc<dyn WikiHost> = Arc::new(FsWiki::new(settings.wiki_root.clone()));
    let database = &settings.export.queue.database;
    let store = QueueStore::open(database)
        .with_context(|| format!("opening queue database {database:?}"))?;
    let services = ExportServices::new(
        settings.export.clone(),
        host,
        store,
        ServiceOptions::default(),
    );
    if !services.catalog.is_configured() {
        rag_warn!("Export is not configured: a target and a non-empty pipeline are required");
    }
    Ok(services)
}

fn outcome_table(results: &BTreeMap<String, RunStatus>) -> String {
    let mut table = Table::new(&["Page", "Written", "Skipped", "Failed"]);
    for (page, status) in results {
        let failed: Vec<String> = status
            .failed()
            .iter()
            .map(|(key, message)| format!("{key}: {message}"))
            .collect();
        table.add_row(vec![
            page.clone(),
            status.success().join(", "),
            status.skipped().join(", "),
            failed.join("; "),
        ]);
    }
    table.render()
}

pub fn export_queued(services: &ExportServices, limit: Option<usize>) -> Result<String> {
    let results = services.export_queued(limit)?;
    rag_info!("Exported {} pages", results.len());
    Ok(format!(
        "{}{} pages exported\n",
        outcome_table(&results),
        results.len()
    ))
}

pub fn schedule_all(services: &ExportServices) -> Result<String> {
    let summary = services.schedule_all()?;
    Ok(format!(
        "Scheduled {} pages and {} context providers\n",
        summary.pages, summary.context_providers
    ))
}

pub fn full_reindex(services: &ExportServices) -> Result<String> {
    let results = services.full_reindex()?;
    Ok(format!(
        "{}{} pages exported\n",
        outcome_table(&results),
        results.len()
    ))
}

pub fn show_queued(services: &ExportServices) -> Result<String> {
    let mut table = Table::new(&["Page", "Providers", "Scheduled"]);
    for item in services.scheduler.get_queued()? {
        let page = match item.page_ref() {
            Some(reference) if !reference.is_context_marker() => reference.to_string(),
            Some(_) => "(context)".to_string(),
            None => item.queue_key(),
        };
        table.add_row(vec![
            page,
            item.providers.join(", "),
            item.scheduled_at.to_rfc3339(),
        ]);
    }
    Ok(table.render())
}

pub fn show_history(services: &ExportServices, page: &str) -> Result<String> {
    let reference = parse_page(page)?;
    let mut table = Table::new(&["Provider", "Status", "Error", "Timestamp"]);
    for entry in services.scheduler.get_history_for_page(&reference)? {
        table.add_row(vec![
            entry.pipeline_key,
            entry.status.as_str().to_string(),
            entry.error_message.unwrap_or_default(),
            entry.timestamp.to_rfc3339(),
        ]);
    }
    Ok(table.render())
}

/// Export one artifact; its content is returned unless written to `out`.
pub fn export_item(
    services: &ExportServices,
    id_base: &str,
    provider: &str,
    out: Option<&Path>,
) -> Result<String> {
    let descriptor = services.runner.export_item(id_base, provider)?;
    match out {
        Some(path) => {
            fs::write(path, descriptor.content())
                .with_context(|| format!("writing {path:?}"))?;
            Ok(format!(
                "Wrote {} ({} bytes) to {}\n",
                descriptor.file_name(),
                descriptor.content().len(),
                path.display()
            ))
        }
        None => Ok(descriptor.content_lossy()),
    }
}

pub fn notify(
    services: &ExportServices,
    kind: EventKind,
    page: &str,
    to: Option<&str>,
    redirect: bool,
) -> Result<String> {
    let page = resolve(services, page)?;
    let event = match kind {
        EventKind::Saved => PageEvent::Saved {
            page,
            created: false,
        },
        EventKind::Created => PageEvent::Saved {
            page,
            created: true,
        },
        EventKind::Deleted => PageEvent::Deleted { page },
        EventKind::Undeleted => PageEvent::Undeleted { page },
        EventKind::Uploaded => PageEvent::FileUploaded { page },
        EventKind::Moved => {
            let Some(to) = to else {
                bail!("`--to` is required for moved pages");
            };
            PageEvent::Moved {
                old: page,
                new: resolve(services, to)?,
                redirect_left: redirect,
            }
        }
    };
    services.notify(&event)?;
    let queued = services.scheduler.get_queued()?.len();
    Ok(format!("Event delivered; {queued} queue groups pending\n"))
}

fn parse_page(text: &str) -> Result<PageRef> {
    PageRef::parse(text).ok_or_else(|| anyhow!("invalid page title `{text}`"))
}

fn resolve(services: &ExportServices, text: &str) -> Result<Page> {
    let reference = parse_page(text)?;
    services
        .host
        .resolve_page(reference.namespace(), reference.title())
        .ok_or_else(|| anyhow!("cannot resolve page `{text}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;
    use wikirag_engine::TargetDescriptor;

    fn setup() -> (TempDir, ExportServices) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("wiki");
        fs::create_dir_all(root.join("0")).unwrap();
        fs::write(root.join("0").join("Guide.wiki"), "== Intro ==\ntext").unwrap();

        let mut settings = CliSettings::default();
        settings.wiki_root = root;
        settings.export.wiki_id = "docs".into();
        settings.export.pipeline = vec!["wikitext".into()];
        settings.export.queue.database = temp.path().join("queue.sqlite3");
        settings.export.target = Some(TargetDescriptor {
            kind: "local-directory".into(),
            configuration: json!({ "path": temp.path().join("out").to_string_lossy() }),
        });
        let services = build_services(&settings).unwrap();
        (temp, services)
    }

    #[test]
    fn notify_then_export_queued() {
        let (temp, services) = setup();

        notify(&services, EventKind::Saved, "Guide", None, false).unwrap();
        let queued = show_queued(&services).unwrap();
        assert!(queued.contains("| Guide "));
        assert!(queued.contains("wikitext, id"));

        let report = export_queued(&services, None).unwrap();
        assert!(report.ends_with("1 pages exported\n"));
        let written = fs::read_dir(temp.path().join("out")).unwrap().count();
        assert_eq!(written, 2);

        let history = show_history(&services, "Guide").unwrap();
        assert!(history.contains("| wikitext "));
        assert!(history.contains("success"));
    }

    #[test]
    fn moved_requires_a_destination() {
        let (_temp, services) = setup();

        assert!(notify(&services, EventKind::Moved, "Guide", None, false).is_err());
    }

    #[test]
    fn export_item_returns_the_content() {
        let (temp, services) = setup();

        let content = export_item(&services, "docs|0|Guide", "wikitext", None).unwrap();
        assert_eq!(content, "== Intro ==\ntext");

        let out = temp.path().join("guide.txt");
        export_item(&services, "docs|0|Guide", "wikitext", Some(&out)).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "== Intro ==\ntext");
    }

    #[test]
    fn schedule_all_reports_counts() {
        let (_temp, services) = setup();

        let report = schedule_all(&services).unwrap();

        assert_eq!(report, "Scheduled 1 pages and 2 context providers\n");
    }
}
