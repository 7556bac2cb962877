//! Shared environment configuration for the Can't Stop binaries.
//!
//! Consolidates `CANTSTOP_PORT`, `CANTSTOP_SEED`, `RAYON_NUM_THREADS` and
//! `RUST_LOG` reads.

/// Read `RAYON_NUM_THREADS` (fallback `OMP_NUM_THREADS`, default 8).
fn rayon_threads_from_env() -> usize {
    std::env::var("RAYON_NUM_THREADS")
        .or_else(|_| std::env::var("OMP_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(8)
}

/// Build the rayon global pool used by the odds enumeration.
/// Tolerates an already-initialized pool. Returns thread count.
pub fn init_rayon_threads_lenient() -> usize {
    let num_threads = rayon_threads_from_env();
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .ok(); // May fail if already initialized
    println!("Rayon threads: {}", num_threads);
    num_threads
}

/// Read `CANTSTOP_PORT` (default 9000).
pub fn server_port() -> u16 {
    std::env::var("CANTSTOP_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9000)
}

/// Read `CANTSTOP_SEED`; `None` when unset or unparsable.
pub fn fixed_seed() -> Option<u64> {
    std::env::var("CANTSTOP_SEED")
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

/// Install the global tracing subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
}
