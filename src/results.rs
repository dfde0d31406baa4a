//! Consumer-side model of one search: what a result list or status bar shows.

use crate::events::{SearchEvent, SearchSummary, SessionId};
use crate::record::MatchRecord;
use std::cmp::Ordering;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Location,
    Size,
    Modified,
}

#[derive(Debug, Clone)]
pub struct SearchResults {
    session: SessionId,
    records: Vec<MatchRecord>,
    scanned: u64,
    total: Option<u64>,
    status: String,
    summary: Option<SearchSummary>,
}

impl SearchResults {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            records: Vec::new(),
            scanned: 0,
            total: None,
            status: String::new(),
            summary: None,
        }
    }

    /// Folds one event into the model. Returns `false` for events that were
    /// ignored: other sessions, or matches after the finished event.
    pub fn apply(&mut self, event: SearchEvent) -> bool {
        if event.session() != self.session {
            return false;
        }
        match event {
            SearchEvent::Started { .. } => {}
            SearchEvent::Found { record, .. } => {
                if self.summary.is_some() {
                    return false;
                }
                self.records.push(record);
            }
            SearchEvent::Progress { scanned, total, .. } => {
                self.scanned = self.scanned.max(scanned);
                if total.is_some() {
                    self.total = total;
                }
            }
            SearchEvent::Status { message, .. } => self.status = message,
            SearchEvent::Finished { summary, .. } => {
                self.scanned = self.scanned.max(summary.scanned);
                self.summary = Some(summary);
            }
        }
        true
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn summary(&self) -> Option<&SearchSummary> {
        self.summary.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.summary.is_some()
    }

    /// Percentage for determinate searches, `None` while the total is unknown.
    pub fn percent(&self) -> Option<u8> {
        let total = self.total.filter(|t| *t > 0)?;
        Some((self.scanned.saturating_mul(100) / total).min(100) as u8)
    }

    pub fn sort_by(&mut self, key: SortKey, descending: bool) {
        self.records.sort_by(|a, b| {
            let ord = compare(a, b, key);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }
}

fn compare(a: &MatchRecord, b: &MatchRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Location => a.directory.cmp(&b.directory).then_with(|| a.name.cmp(&b.name)),
        SortKey::Size => b
            .is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.size.cmp(&b.size)),
        SortKey::Modified => a.last_modified.cmp(&b.last_modified),
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{secs:.1} seconds")
    } else {
        let whole = elapsed.as_secs();
        format!("{}:{:02} minutes", whole / 60, whole % 60)
    }
}
