use std::sync::Once;

use rayon::ThreadPoolBuilder;

/// Env hints consulted for the pool size, most specific first. The SLURM/PBS
/// entries matter on batch clusters where `available_parallelism` reports the
/// whole node instead of the allocation.
const ENV_HINTS: [&str; 6] = [
    "REAPPORTION_THREADS",
    "RAYON_NUM_THREADS",
    "SLURM_CPUS_PER_TASK",
    "SLURM_CPUS_ON_NODE",
    "PBS_NP",
    "OMP_NUM_THREADS",
];

fn env_hint() -> Option<(usize, &'static str)> {
    ENV_HINTS.iter().find_map(|&key| {
        std::env::var(key)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .map(|n| (n, key))
    })
}

/// Size the global rayon pool once, before any batch runs. An explicit
/// `threads` wins over env hints; env hints win over hardware detection.
pub fn configure_thread_pool(threads: Option<usize>) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let (count, source) = match threads.filter(|&n| n > 0) {
            Some(n) => (n, "--threads"),
            None => env_hint().unwrap_or_else(|| {
                let n = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1);
                (n, "available_parallelism")
            }),
        };
        match ThreadPoolBuilder::new()
            .num_threads(count)
            .thread_name(|i| format!("reapportion-worker-{i}"))
            .build_global()
        {
            Ok(()) => log::info!("rayon pool = {count} threads (hint: {source})"),
            Err(err) => {
                log::warn!("failed to configure rayon pool ({err}); continuing with default");
            }
        }
    });
}
