use std::sync::OnceLock;

pub const MAX_WALK_THREADS: usize = 32;
pub const DISCOVERY_THREADS_ENV: &str = "CONTEXT_DISCOVERY_THREADS";

const DEFAULT_WALK_THREADS: usize = 1;

fn parse_walk_threads(raw: Option<&str>, default_value: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, MAX_WALK_THREADS)
}

/// Walker threads per workspace folder, read once from
/// `CONTEXT_DISCOVERY_THREADS`. One thread gives a sorted, sequential walk.
pub fn walk_threads_from_env() -> usize {
    static THREADS: OnceLock<usize> = OnceLock::new();
    *THREADS.get_or_init(|| {
        let raw = std::env::var(DISCOVERY_THREADS_ENV).ok();
        parse_walk_threads(raw.as_deref(), DEFAULT_WALK_THREADS)
    })
}

pub(crate) fn clamp_walk_threads(threads: usize) -> usize {
    threads.clamp(1, MAX_WALK_THREADS)
}
