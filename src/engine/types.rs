use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;

pub static DEPTH_LIMIT_OVERRIDE: AtomicU64 = AtomicU64::new(u64::MAX);
pub static STEP_LIMIT_OVERRIDE: AtomicU64 = AtomicU64::new(u64::MAX);

static TOTAL_REDUCTIONS: AtomicU64 = AtomicU64::new(0);
static MAX_STACK: AtomicUsize = AtomicUsize::new(0);

pub const DEFAULT_DEPTH_LIMIT: usize = 1000;

fn depth_limit() -> usize {
    let override_limit = DEPTH_LIMIT_OVERRIDE.load(Ordering::Relaxed);
    if override_limit != u64::MAX {
        return override_limit as usize;
    }
    static LIMIT: OnceLock<usize> = OnceLock::new();
    *LIMIT.get_or_init(|| {
        std::env::var("LAZYRT_DEPTH_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_DEPTH_LIMIT)
    })
}

pub fn set_depth_limit_override(limit: Option<usize>) {
    let val = limit.map(|l| l as u64).unwrap_or(u64::MAX);
    DEPTH_LIMIT_OVERRIDE.store(val, Ordering::Relaxed);
}

// 0 disables the limit.
fn step_limit() -> Option<u64> {
    let override_limit = STEP_LIMIT_OVERRIDE.load(Ordering::Relaxed);
    let limit = if override_limit != u64::MAX {
        override_limit
    } else {
        static LIMIT: OnceLock<u64> = OnceLock::new();
        *LIMIT.get_or_init(|| {
            std::env::var("LAZYRT_STEP_LIMIT")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
        })
    };
    (limit > 0).then_some(limit)
}

pub fn set_step_limit_override(limit: Option<u64>) {
    let val = limit.unwrap_or(u64::MAX);
    STEP_LIMIT_OVERRIDE.store(val, Ordering::Relaxed);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReduceConfig {
    /// Maximum nesting of `force` calls (switch scrutinees, string realization).
    pub depth_limit: usize,
    /// Abort after this many reduction steps on one machine.
    pub step_limit: Option<u64>,
}

impl ReduceConfig {
    pub fn from_env() -> Self {
        Self {
            depth_limit: depth_limit(),
            step_limit: step_limit(),
        }
    }
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            depth_limit: DEFAULT_DEPTH_LIMIT,
            step_limit: None,
        }
    }
}

/// Per-machine counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub reductions: u64,
    pub max_stack: usize,
}

pub(crate) fn record_reduction() {
    TOTAL_REDUCTIONS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_stack_depth(depth: usize) {
    MAX_STACK.fetch_max(depth, Ordering::Relaxed);
}

/// Reduction steps taken by every machine in this process.
pub fn total_reductions() -> u64 {
    TOTAL_REDUCTIONS.load(Ordering::Relaxed)
}

/// Deepest pending-argument stack seen in this process.
pub fn max_stack_depth() -> usize {
    MAX_STACK.load(Ordering::Relaxed)
}
