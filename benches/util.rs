//! Shared helper functions for benchmarks
//!
//! Seed resolution and Criterion configuration used by every benchmark file.

use criterion::Criterion;
use std::sync::OnceLock;

/// Get the deterministic seed for synthetic catalogs.
/// Reads `HALO_PAIRS_BENCH_SEED` (decimal or 0x-hex). Defaults to 0xA11CE.
/// Prints the resolved seed once on first use if `PRINT_BENCH_SEED` is set.
pub fn get_benchmark_seed() -> u64 {
    static SEED: OnceLock<u64> = OnceLock::new();
    *SEED.get_or_init(|| {
        let seed = std::env::var("HALO_PAIRS_BENCH_SEED")
            .ok()
            .and_then(|s| {
                let s = s.trim();
                s.strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .map_or_else(|| s.parse().ok(), |hex| u64::from_str_radix(hex, 16).ok())
            })
            .unwrap_or(0xA11CE);
        if std::env::var("PRINT_BENCH_SEED").is_ok() {
            eprintln!("Benchmark seed: 0x{seed:X} ({seed})");
        }
        seed
    })
}

/// Criterion configuration honouring `CRIT_SAMPLE_SIZE` and
/// `CRIT_MEASUREMENT_MS`.
pub fn bench_config() -> Criterion {
    use std::time::Duration;
    let mut c = Criterion::default();

    if let Some(v) = std::env::var("CRIT_SAMPLE_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
    {
        c = c.sample_size(v);
    } else if std::env::var("CRIT_SAMPLE_SIZE").is_ok() {
        eprintln!("Warning: Failed to parse CRIT_SAMPLE_SIZE, using default");
    }

    if let Some(ms) = std::env::var("CRIT_MEASUREMENT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
    {
        c = c.measurement_time(Duration::from_millis(ms));
    }

    c
}
