//! Splits the top-level subdirectories of a root into contiguous chunks, one
//! per subtree worker. Directories are assumed to cost roughly the same, so
//! skewed trees can leave one worker with most of the work.

/// One core stays free for the caller; never less than one worker.
pub fn worker_count(subdirectories: usize, parallelism: usize) -> usize {
    subdirectories.min(parallelism.saturating_sub(1)).max(1)
}

/// Contiguous, order-preserving split into `worker_count` chunks whose sizes
/// differ by at most one. Fewer chunks are returned when there are fewer
/// items than workers.
pub fn partition<T>(items: Vec<T>, worker_count: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    let chunks = worker_count.clamp(1, items.len());
    let base = items.len() / chunks;
    let extra = items.len() % chunks;

    let mut out = Vec::with_capacity(chunks);
    let mut rest = items.into_iter();
    for index in 0..chunks {
        let size = base + usize::from(index < extra);
        out.push(rest.by_ref().take(size).collect());
    }
    out
}
