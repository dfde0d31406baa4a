use crate::record::MatchRecord;
use crate::session::SearchSession;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

pub type SessionId = u64;

/// Tag for status messages that belong to no session (rejected starts).
pub const NO_SESSION: SessionId = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSummary {
    pub matches: u64,
    pub scanned: u64,
    pub elapsed: Duration,
    pub aborted: bool,
}

#[derive(Debug, Clone)]
pub enum SearchEvent {
    Started {
        session: SessionId,
    },
    Found {
        session: SessionId,
        record: MatchRecord,
    },
    /// `total` is `None` while the amount of work is unknown.
    Progress {
        session: SessionId,
        scanned: u64,
        total: Option<u64>,
    },
    Status {
        session: SessionId,
        message: String,
    },
    Finished {
        session: SessionId,
        summary: SearchSummary,
    },
}

impl SearchEvent {
    pub fn session(&self) -> SessionId {
        match self {
            SearchEvent::Started { session }
            | SearchEvent::Found { session, .. }
            | SearchEvent::Progress { session, .. }
            | SearchEvent::Status { session, .. }
            | SearchEvent::Finished { session, .. } => *session,
        }
    }
}

/// Sends events for one session. The channel is unbounded, so workers never
/// wait on the consumer; a closed receiver aborts the session.
#[derive(Debug, Clone)]
pub(crate) struct Emitter {
    session: Arc<SearchSession>,
    tx: Sender<SearchEvent>,
    progress_every: u64,
}

impl Emitter {
    pub(crate) fn new(
        session: Arc<SearchSession>,
        tx: Sender<SearchEvent>,
        progress_every: u64,
    ) -> Self {
        Self {
            session,
            tx,
            progress_every,
        }
    }

    pub(crate) fn session(&self) -> &Arc<SearchSession> {
        &self.session
    }

    fn send(&self, event: SearchEvent) {
        if self.tx.send(event).is_err() {
            self.session.abort();
        }
    }

    pub(crate) fn started(&self) {
        self.send(SearchEvent::Started {
            session: self.session.id(),
        });
    }

    pub(crate) fn status(&self, message: impl Into<String>) {
        self.send(SearchEvent::Status {
            session: self.session.id(),
            message: message.into(),
        });
    }

    /// Counts the match and delivers it, unless the session was aborted.
    pub(crate) fn found(&self, record: MatchRecord) -> bool {
        let session = self.session.id();
        self.session.record_match(|| {
            self.send(SearchEvent::Found { session, record });
        })
    }

    /// Coarse progress: only every `progress_every` entries.
    pub(crate) fn scanned(&self, count: u64) {
        self.session
            .add_scanned(count, self.progress_every, false, |scanned| {
                self.send(SearchEvent::Progress {
                    session: self.session.id(),
                    scanned,
                    total: None,
                })
            });
    }

    /// Unconditional progress tick, optionally with a known total.
    pub(crate) fn scanned_tick(&self, count: u64, total: Option<u64>) {
        self.session
            .add_scanned(count, self.progress_every, true, |scanned| {
                self.send(SearchEvent::Progress {
                    session: self.session.id(),
                    scanned,
                    total,
                })
            });
    }

    pub(crate) fn finished(&self, summary: SearchSummary) {
        self.send(SearchEvent::Finished {
            session: self.session.id(),
            summary,
        });
    }
}
