use std::any::Any;
use std::panic::{
    self,
    AssertUnwindSafe,
};

use rayon::ThreadPool;
use tn_core::{
    RoutingError,
    RoutingResult,
};

/// Dedicated pool of `parallelism` threads named `{name}-{i}`.
pub(crate) fn worker_pool(parallelism: usize, name: &'static str) -> RoutingResult<ThreadPool> {
    if parallelism == 0 {
        return Err(RoutingError::config("parallelism must be at least 1"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism)
        .thread_name(move |i| format!("{name}-{i}"))
        .build()
        .map_err(|err| RoutingError::WorkerFailed { phase: "pool setup", reason: err.to_string() })
}

/// Runs `work` on `pool`, turning a worker panic into [`RoutingError::WorkerFailed`].
///
/// Parallel iterators and joins inside `work` stay on `pool`.
pub(crate) fn run_phase<T: Send>(
    pool: &ThreadPool,
    phase: &'static str,
    work: impl FnOnce() -> T + Send,
) -> RoutingResult<T> {
    catch_worker_panic(phase, || pool.install(work))
}

/// Runs `work`, turning a panic anywhere inside it into [`RoutingError::WorkerFailed`].
pub(crate) fn catch_worker_panic<T>(phase: &'static str, work: impl FnOnce() -> T) -> RoutingResult<T> {
    panic::catch_unwind(AssertUnwindSafe(work))
        .map_err(|payload| RoutingError::WorkerFailed { phase, reason: panic_message(payload.as_ref()) })
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_owned())
}
