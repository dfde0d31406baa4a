use crate::config::SearchConfig;
use crate::error::Result;
use crate::events::{Emitter, SearchEvent, SearchSummary, SessionId, NO_SESSION};
use crate::filters::SearchFilters;
use crate::partition::{partition, worker_count};
use crate::request::SearchRequest;
use crate::session::{SearchSession, SessionSnapshot};
use crate::worker::{list_subdirectories, ScanContext};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

/// Coordinates searches: owns the configured request and the active session,
/// spawns workers and reports everything through one event channel.
pub struct FileSearcher {
    config: SearchConfig,
    tx: Sender<SearchEvent>,
    request: Option<SearchRequest>,
    current: Option<Arc<SearchSession>>,
    next_session_id: SessionId,
}

/// Cancels one session from any thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    session: Arc<SearchSession>,
    tx: Sender<SearchEvent>,
}

impl StopHandle {
    pub fn session(&self) -> SessionId {
        self.session.id()
    }

    pub fn stop(&self) {
        stop_session(&self.session, &self.tx);
    }
}

fn stop_session(session: &Arc<SearchSession>, tx: &Sender<SearchEvent>) {
    if !session.is_running() || session.is_aborted() {
        return;
    }
    session.abort();
    debug!(session = session.id(), "stop requested");
    Emitter::new(Arc::clone(session), tx.clone(), 0).status("Stopping search...");
}

impl FileSearcher {
    pub fn new(config: SearchConfig) -> (Self, Receiver<SearchEvent>) {
        let (tx, rx) = mpsc::channel::<SearchEvent>();
        (Self::with_sender(config, tx), rx)
    }

    pub fn with_sender(config: SearchConfig, tx: Sender<SearchEvent>) -> Self {
        Self {
            config,
            tx,
            request: None,
            current: None,
            next_session_id: NO_SESSION + 1,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Validates and stores the next search. Nothing is started; a rejected
    /// configuration also forgets the previous one.
    pub fn configure(
        &mut self,
        roots: Vec<PathBuf>,
        term: &str,
        filters: SearchFilters,
    ) -> Result<SearchRequest> {
        match SearchRequest::new(roots, term, filters) {
            Ok(request) => {
                self.request = Some(request.clone());
                Ok(request)
            }
            Err(err) => {
                self.request = None;
                Err(err)
            }
        }
    }

    pub fn request(&self) -> Option<&SearchRequest> {
        self.request.as_ref()
    }

    /// Starts a fresh session for the configured request, discarding the
    /// previous one. Returns `false` when there is nothing to search.
    pub fn start(&mut self) -> bool {
        let Some(request) = self.request.clone() else {
            let _ = self.tx.send(SearchEvent::Status {
                session: NO_SESSION,
                message: "Nothing to search for".to_string(),
            });
            return false;
        };

        if let Some(previous) = self.current.take() {
            debug!(session = previous.id(), "discarding previous session");
            previous.abort();
        }

        let id = self.next_session_id;
        self.next_session_id = self.next_session_id.saturating_add(1);
        let session = SearchSession::new(id, request);
        let emitter = Emitter::new(
            Arc::clone(&session),
            self.tx.clone(),
            self.config.progress_every,
        );
        emitter.started();

        let config = self.config.clone();
        let dispatcher = emitter.clone();
        let spawned = thread::Builder::new()
            .name(format!("search-{id}"))
            .spawn(move || run_session(dispatcher, config));
        if let Err(err) = spawned {
            warn!(session = id, error = %err, "failed to start search thread");
            session.abort();
            emitter.status(format!("Search error: {err}"));
            session.mark_finished();
            emitter.finished(summarize(&session));
        }

        self.current = Some(session);
        true
    }

    /// Requests cancellation without waiting for the workers.
    pub fn stop(&self) {
        if let Some(session) = &self.current {
            stop_session(session, &self.tx);
        }
    }

    /// Stops and forgets the current session.
    pub fn clear(&mut self) {
        self.stop();
        self.current = None;
    }

    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|s| s.is_running())
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.current.as_ref().map(|s| s.id())
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.current.as_ref().map(|s| s.snapshot())
    }

    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.current.as_ref().map(|session| StopHandle {
            session: Arc::clone(session),
            tx: self.tx.clone(),
        })
    }
}

fn summarize(session: &SearchSession) -> SearchSummary {
    let snapshot = session.snapshot();
    SearchSummary {
        matches: snapshot.matches,
        scanned: snapshot.scanned,
        elapsed: session.elapsed(),
        aborted: session.is_aborted(),
    }
}

fn spawn_worker(
    emitter: &Emitter,
    config: &SearchConfig,
    role: &str,
    job: impl FnOnce(&ScanContext) + Send + 'static,
) {
    let session = emitter.session();
    let slot = session.register_worker();
    let name = format!("search-{}-{role}-{}", session.id(), slot.id());
    let ctx = ScanContext::new(emitter.clone(), config.skip_hidden_dirs);
    let spawned = thread::Builder::new().name(name).spawn(move || {
        let _slot = slot;
        job(&ctx);
    });
    if let Err(err) = spawned {
        warn!(session = session.id(), role, error = %err, "failed to spawn worker");
        emitter.status(format!("Could not start {role} worker: {err}"));
    }
}

/// Dispatches workers for every root, then waits for them to drain or for
/// the session to be aborted.
fn run_session(emitter: Emitter, config: SearchConfig) {
    let session = Arc::clone(emitter.session());
    let request = session.request();
    let parallelism = config.parallelism();
    info!(
        session = session.id(),
        roots = request.roots().len(),
        term = request.term(),
        "search started"
    );
    emitter.status(format!("Searching using all {parallelism} CPU cores"));

    for root in request.roots() {
        if session.is_aborted() {
            break;
        }
        if !root.exists() {
            emitter.status(format!("Location not found: {}", root.display()));
            continue;
        }

        if !request.filters().include_subfolders {
            let root = root.clone();
            spawn_worker(&emitter, &config, "location", move |ctx| {
                ctx.scan_location(&root)
            });
            continue;
        }

        let top = root.clone();
        spawn_worker(&emitter, &config, "root", move |ctx| ctx.scan_root_level(&top));

        match list_subdirectories(root, config.skip_hidden_dirs) {
            Ok(subdirs) => {
                let workers = worker_count(subdirs.len(), parallelism);
                debug!(
                    root = %root.display(),
                    subdirs = subdirs.len(),
                    workers,
                    "partitioning root"
                );
                for chunk in partition(subdirs, workers) {
                    spawn_worker(&emitter, &config, "subtree", move |ctx| {
                        ctx.scan_subtrees(&chunk)
                    });
                }
            }
            Err(err) => {
                debug!(root = %root.display(), error = %err, "root not listable, walking it whole");
                let root = root.clone();
                spawn_worker(&emitter, &config, "location", move |ctx| {
                    ctx.scan_location(&root)
                });
            }
        }
    }

    while session.in_flight() > 0 && !session.is_aborted() {
        thread::sleep(config.poll_interval());
    }

    let summary = summarize(&session);
    let outcome = if summary.aborted { "stopped" } else { "complete" };
    info!(
        session = session.id(),
        matches = summary.matches,
        scanned = summary.scanned,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        outcome,
        "search finished"
    );
    emitter.status(format!("Search {outcome}. Found {} items.", summary.matches));
    session.mark_finished();
    emitter.finished(summary);
}
