//! ReapKV soak tool
//!
//! Fills a store from concurrent writer tasks, lets part of the data expire,
//! and reaps it, round after round. Useful for eyeballing how shard count
//! and reap concurrency trade insert throughput against reap latency.

use bytes::Bytes;
use reapkv::{BytesStore, StoreConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Soak configuration
struct Config {
    /// Store shards
    shards: usize,
    /// Concurrent shard sweeps per reap
    reapers: usize,
    /// Keys written per round
    keys: usize,
    /// Writer tasks per round
    writers: usize,
    /// TTL given to half of the keys
    ttl: Duration,
    /// Number of write/reap rounds
    rounds: usize,
}

impl Default for Config {
    fn default() -> Self {
        let store = StoreConfig::default();
        Self {
            shards: store.shard_count,
            reapers: store.reap_concurrency,
            keys: 100_000,
            writers: 8,
            ttl: Duration::from_millis(100),
            rounds: 5,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--shards" | "-s" => config.shards = parse_value(&args, i),
                "--reapers" | "-r" => config.reapers = parse_value(&args, i),
                "--keys" | "-k" => config.keys = parse_value(&args, i),
                "--writers" | "-w" => config.writers = parse_value(&args, i),
                "--ttl-ms" | "-t" => config.ttl = Duration::from_millis(parse_value(&args, i)),
                "--rounds" | "-n" => config.rounds = parse_value(&args, i),
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("reapkv version {}", reapkv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
            i += 2;
        }

        config
    }
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize) -> T {
    let Some(raw) = args.get(i + 1) else {
        eprintln!("Error: {} requires a value", args[i]);
        std::process::exit(1);
    };
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid value for {}: {}", args[i], raw);
        std::process::exit(1);
    })
}

fn print_help() {
    println!(
        r#"
ReapKV soak tool - concurrent writes with explicit, bounded reaping

USAGE:
    reapkv [OPTIONS]

OPTIONS:
    -s, --shards <N>      Number of shards (default: 64)
    -r, --reapers <N>     Concurrent shard sweeps per reap (default: 4)
    -k, --keys <N>        Keys written per round (default: 100000)
    -w, --writers <N>     Writer tasks per round (default: 8)
    -t, --ttl-ms <MS>     TTL for the expiring half of the keys (default: 100)
    -n, --rounds <N>      Write/reap rounds (default: 5)
    -v, --version         Print version information
        --help            Print this help message

Set RUST_LOG=reapkv=debug to see per-reap details.
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let store = Arc::new(BytesStore::new(
        StoreConfig::new()
            .with_shard_count(config.shards)
            .with_reap_concurrency(config.reapers),
    )?);
    info!(
        shards = store.shard_count(),
        reapers = store.reap_concurrency(),
        "Store initialized"
    );

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping soak...");
    };

    tokio::select! {
        result = soak(Arc::clone(&store), &config) => result?,
        _ = shutdown => {}
    }

    let stats = store.stats();
    info!(
        keys = stats.keys,
        reaps = stats.reaps,
        reaped = stats.reaped,
        peak_concurrent_sweeps = stats.peak_concurrent_sweeps,
        peak_concurrent_reaps = stats.peak_concurrent_reaps,
        "Soak complete"
    );
    Ok(())
}

/// Runs the configured number of write/expire/reap rounds.
async fn soak(store: Arc<BytesStore>, config: &Config) -> anyhow::Result<()> {
    let value = Bytes::from_static(b"soak-value");
    let writers = config.writers.max(1);
    let per_writer = config.keys / writers;

    for round in 0..config.rounds {
        let started = Instant::now();

        let mut tasks = Vec::with_capacity(writers);
        for w in 0..writers {
            let store = Arc::clone(&store);
            let value = value.clone();
            let ttl = config.ttl;
            tasks.push(tokio::spawn(async move {
                for i in 0..per_writer {
                    // Half the keys expire, half live forever
                    let key = format!("r{}:w{}:k{}", round, w, i);
                    let ttl = if i % 2 == 0 { ttl } else { Duration::ZERO };
                    store.set(key, value.clone(), ttl);
                }
            }));
        }
        for task in tasks {
            task.await?;
        }
        let write_elapsed = started.elapsed();

        tokio::time::sleep(config.ttl).await;

        let reaped_before = store.stats().reaped;
        let reap_started = Instant::now();
        store.reap_async(false).await?;
        let reap_elapsed = reap_started.elapsed();

        info!(
            round = round,
            written = per_writer * writers,
            write_ms = write_elapsed.as_millis() as u64,
            reap_ms = reap_elapsed.as_millis() as u64,
            reaped = store.stats().reaped - reaped_before,
            remaining = store.len(),
            "Round complete"
        );
    }

    Ok(())
}
