use crate::events::SessionId;
use crate::request::SearchRequest;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// State of one search invocation.
///
/// Workers hold an `Arc` captured at spawn time, so a worker that outlives its
/// session keeps polling and counting against that session only. A new search
/// always gets a fresh session with its own abort flag and counters.
#[derive(Debug)]
pub struct SearchSession {
    id: SessionId,
    request: SearchRequest,
    started_at: Instant,
    abort: AtomicBool,
    running: AtomicBool,
    state: Mutex<SessionState>,
}

#[derive(Debug, Default)]
struct SessionState {
    scanned: u64,
    matches: u64,
    next_worker: u64,
    in_flight: BTreeSet<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub scanned: u64,
    pub matches: u64,
    pub in_flight: usize,
}

impl SearchSession {
    pub(crate) fn new(id: SessionId, request: SearchRequest) -> Arc<Self> {
        Arc::new(Self {
            id,
            request,
            started_at: Instant::now(),
            abort: AtomicBool::new(false),
            running: AtomicBool::new(true),
            state: Mutex::new(SessionState::default()),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }

    pub(crate) fn abort(&self) {
        self.abort.store(true, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn mark_finished(&self) {
        self.running.store(false, Ordering::Release);
    }

    // Counters stay consistent even if a worker panicked while holding the lock.
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `count` scanned entries. `on_tick` runs under the lock with the new
    /// total when a multiple of `every` was crossed, or always when `force`.
    pub(crate) fn add_scanned(
        &self,
        count: u64,
        every: u64,
        force: bool,
        on_tick: impl FnOnce(u64),
    ) {
        let mut state = self.lock();
        let before = state.scanned;
        state.scanned = before.saturating_add(count);
        let after = state.scanned;
        let crossed = every == 0 || (count > 0 && before / every != after / every);
        if force || crossed {
            on_tick(after);
        }
    }

    /// Counts a match and runs `deliver` under the same lock, unless the
    /// session was aborted.
    pub(crate) fn record_match(&self, deliver: impl FnOnce()) -> bool {
        let mut state = self.lock();
        if self.is_aborted() {
            return false;
        }
        state.matches += 1;
        deliver();
        true
    }

    /// Reserves an in-flight slot. Taken before the worker thread is spawned
    /// so completion detection never sees a gap.
    pub(crate) fn register_worker(self: &Arc<Self>) -> WorkerSlot {
        let mut state = self.lock();
        let id = state.next_worker;
        state.next_worker += 1;
        state.in_flight.insert(id);
        WorkerSlot {
            session: Arc::clone(self),
            id,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            scanned: state.scanned,
            matches: state.matches,
            in_flight: state.in_flight.len(),
        }
    }
}

/// Releases the in-flight slot when the worker returns.
#[derive(Debug)]
pub(crate) struct WorkerSlot {
    session: Arc<SearchSession>,
    id: u64,
}

impl WorkerSlot {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.session.lock().in_flight.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::SearchFilters;
    use std::path::PathBuf;

    fn session(id: SessionId) -> Arc<SearchSession> {
        let request = SearchRequest::new(vec![PathBuf::from("/")], "x", SearchFilters::default())
            .expect("request");
        SearchSession::new(id, request)
    }

    #[test]
    fn worker_slots_track_in_flight_set() {
        let session = session(1);
        let first = session.register_worker();
        let second = session.register_worker();
        assert_ne!(first.id(), second.id());
        assert_eq!(session.in_flight(), 2);

        drop(first);
        assert_eq!(session.in_flight(), 1);
        drop(second);
        assert_eq!(session.in_flight(), 0);
    }

    #[test]
    fn progress_ticks_when_crossing_interval() {
        let session = session(1);
        let mut ticks = Vec::new();
        session.add_scanned(60, 100, false, |n| ticks.push(n));
        session.add_scanned(60, 100, false, |n| ticks.push(n));
        session.add_scanned(10, 100, false, |n| ticks.push(n));
        session.add_scanned(0, 100, true, |n| ticks.push(n));
        assert_eq!(ticks, vec![120, 130]);
        assert_eq!(session.snapshot().scanned, 130);
    }

    #[test]
    fn aborted_session_refuses_matches() {
        let session = session(1);
        let mut delivered = 0;
        assert!(session.record_match(|| delivered += 1));
        session.abort();
        assert!(!session.record_match(|| delivered += 1));
        assert_eq!(delivered, 1);
        assert_eq!(session.snapshot().matches, 1);
    }

    #[test]
    fn sessions_do_not_share_abort_flags() {
        let old = session(1);
        let new = session(2);
        old.abort();
        assert!(old.is_aborted());
        assert!(!new.is_aborted());
    }
}
