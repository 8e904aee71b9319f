use chrono::{DateTime, Utc};

use crate::page::{PageRef, CONTEXT_NAMESPACE, CONTEXT_TITLE};

/// One durable queue row: a pending (page, provider) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub namespace: i32,
    pub title: String,
    pub pipeline_key: String,
    pub scheduled_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn is_context(&self) -> bool {
        self.namespace == CONTEXT_NAMESPACE && self.title == CONTEXT_TITLE
    }
}

/// Queue rows of one page (or of the context marker) with their pending
/// provider keys. `scheduled_at` is the time of the oldest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedItem {
    pub namespace: i32,
    pub title: String,
    pub providers: Vec<String>,
    pub scheduled_at: DateTime<Utc>,
}

impl QueuedItem {
    pub fn queue_key(&self) -> String {
        format!("{}:{}", self.namespace, self.title)
    }

    pub fn is_context(&self) -> bool {
        self.namespace == CONTEXT_NAMESPACE && self.title == CONTEXT_TITLE
    }

    /// The page this item stands for, if the title is still a valid key.
    pub fn page_ref(&self) -> Option<PageRef> {
        if self.is_context() {
            return Some(PageRef::context_marker());
        }
        PageRef::new(self.namespace, &self.title)
    }
}

/// Group rows (already in scheduled order) by page.
///
/// Groups appear in the order of their first row, so the oldest pending
/// page comes first. Provider keys keep their row order without repeats.
pub fn group_queue_entries(entries: &[QueueEntry]) -> Vec<QueuedItem> {
    let mut items: Vec<QueuedItem> = Vec::new();
    for entry in entries {
        let existing = items
            .iter_mut()
            .find(|item| item.namespace == entry.namespace && item.title == entry.title);
        match existing {
            Some(item) => {
                if !item.providers.contains(&entry.pipeline_key) {
                    item.providers.push(entry.pipeline_key.clone());
                }
                if entry.scheduled_at < item.scheduled_at {
                    item.scheduled_at = entry.scheduled_at;
                }
            }
            None => items.push(QueuedItem {
                namespace: entry.namespace,
                title: entry.title.clone(),
                providers: vec![entry.pipeline_key.clone()],
                scheduled_at: entry.scheduled_at,
            }),
        }
    }
    items
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStatus {
    Success,
    Fail,
}

impl HistoryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryStatus::Success => "success",
            HistoryStatus::Fail => "fail",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(HistoryStatus::Success),
            "fail" => Some(HistoryStatus::Fail),
            _ => None,
        }
    }
}

/// Last known outcome of one provider for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub pipeline_key: String,
    pub status: HistoryStatus,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Counts reported by a full-reindex scheduling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReindexSummary {
    pub pages: usize,
    pub context_providers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(ns: i32, title: &str, key: &str, secs: i64) -> QueueEntry {
        QueueEntry {
            namespace: ns,
            title: title.to_string(),
            pipeline_key: key.to_string(),
            scheduled_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let rows = vec![
            entry(0, "B", "id", 1),
            entry(0, "A", "id", 2),
            entry(0, "B", "wikitext", 3),
            entry(0, "B", "wikitext", 4),
        ];
        let items = group_queue_entries(&rows);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "B");
        assert_eq!(items[0].providers, vec!["id", "wikitext"]);
        assert_eq!(items[0].scheduled_at, Utc.timestamp_opt(1, 0).unwrap());
        assert_eq!(items[1].queue_key(), "0:A");
    }

    #[test]
    fn context_rows_are_recognized() {
        let row = entry(CONTEXT_NAMESPACE, CONTEXT_TITLE, "analyze", 0);
        assert!(row.is_context());
        let items = group_queue_entries(&[row]);
        assert!(items[0].is_context());
        assert!(items[0].page_ref().unwrap().is_context_marker());
    }

    #[test]
    fn history_status_text() {
        assert_eq!(HistoryStatus::parse("fail"), Some(HistoryStatus::Fail));
        assert_eq!(HistoryStatus::Success.as_str(), "success");
        assert_eq!(HistoryStatus::parse("skipped"), None);
    }
}
