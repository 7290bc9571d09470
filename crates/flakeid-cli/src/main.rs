#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use std::io::{BufWriter, Write};
use std::thread;
use std::time::Instant;

use anyhow::{Context, anyhow};
use clap::Parser;
use config::{ClockArg, CliArgs, Command, GeneratorArg, RuntimeConfig};
use flakeid::{
    AtomicSnowflakeGenerator, Layout, LockSnowflakeGenerator, MonotonicClock, SnowflakeGenerator,
    SystemClock, TimeSource,
};
use telemetry::init_telemetry;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = RuntimeConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    match config.command {
        Command::Generate { count, threads } => match config.clock {
            ClockArg::System => generate_with(&config, SystemClock, count, threads),
            ClockArg::Monotonic => {
                generate_with(&config, MonotonicClock::default(), count, threads)
            }
        },
        Command::Decode { ref ids, json } => decode(&config, ids, json),
        Command::Inspect => inspect(&config.layout),
    }
}

fn log_startup_info(config: &RuntimeConfig) {
    if cfg!(debug_assertions) {
        tracing::debug!("Running with full config: {:#?}", config);
    } else {
        tracing::debug!(
            datacenter_id = config.identity.datacenter_id(),
            worker_id = config.identity.worker_id(),
            "Running with layout {}/{}/{}",
            config.layout.datacenter_bits(),
            config.layout.worker_bits(),
            config.layout.sequence_bits(),
        );
    }
}

fn generate_with<T>(config: &RuntimeConfig, clock: T, count: usize, threads: usize) -> anyhow::Result<()>
where
    T: TimeSource + Send + Sync,
{
    match config.kind {
        GeneratorArg::Lock => {
            let generator = LockSnowflakeGenerator::new(config.generator, clock)?;
            generate(&generator, count, threads)
        }
        GeneratorArg::Atomic => {
            let generator = AtomicSnowflakeGenerator::new(config.generator, clock)?;
            generate(&generator, count, threads)
        }
    }
}

/// Generates `count` IDs over `threads` scoped threads sharing `generator`
/// and prints each thread's batch in the order it was issued.
fn generate<G, T>(generator: &G, count: usize, threads: usize) -> anyhow::Result<()>
where
    G: SnowflakeGenerator<T> + Sync,
    T: TimeSource,
{
    let start = Instant::now();

    let batches = thread::scope(|s| {
        let handles: Vec<_> = split_count(count, threads)
            .into_iter()
            .map(|n| {
                s.spawn(move || {
                    (0..n)
                        .map(|_| generator.generate())
                        .collect::<flakeid::Result<Vec<u64>>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| anyhow!("generator thread panicked"))
            })
            .collect::<anyhow::Result<Vec<_>>>()
    })?;

    let mut out = BufWriter::new(std::io::stdout().lock());
    for batch in batches {
        for id in batch.context("failed to generate id")? {
            writeln!(out, "{id}")?;
        }
    }
    out.flush()?;

    tracing::debug!(count, threads, elapsed = ?start.elapsed(), "Generated ids");
    Ok(())
}

/// Splits `count` into `threads` near-equal parts, the remainder going to the
/// first parts.
fn split_count(count: usize, threads: usize) -> Vec<usize> {
    let (base, extra) = (count / threads, count % threads);
    (0..threads).map(|i| base + usize::from(i < extra)).collect()
}

fn decode(config: &RuntimeConfig, ids: &[u64], json: bool) -> anyhow::Result<()> {
    let epoch_millis = config.generator.epoch_millis();
    let mut out = BufWriter::new(std::io::stdout().lock());

    for &id in ids {
        if id >> 63 != 0 {
            tracing::warn!(id, "sign bit is set, not an id from this layout");
        }
        let parts = config.layout.decompose(id);
        let unix_millis = epoch_millis.saturating_add(parts.timestamp);

        if json {
            let value = serde_json::json!({
                "id": id,
                "unix_millis": unix_millis,
                "components": parts,
            });
            writeln!(out, "{value}")?;
        } else {
            writeln!(
                out,
                "{id}: timestamp={} unix_millis={unix_millis} datacenter_id={} worker_id={} sequence={}",
                parts.timestamp, parts.datacenter_id, parts.worker_id, parts.sequence,
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

fn inspect(layout: &Layout) -> anyhow::Result<()> {
    let mut out = BufWriter::new(std::io::stdout().lock());
    writeln!(out, "field       bits  shift  max")?;
    writeln!(
        out,
        "timestamp   {:>4}  {:>5}  {}",
        layout.timestamp_bits(),
        layout.timestamp_shift(),
        layout.max_timestamp()
    )?;
    writeln!(
        out,
        "datacenter  {:>4}  {:>5}  {}",
        layout.datacenter_bits(),
        layout.datacenter_shift(),
        layout.max_datacenter_id()
    )?;
    writeln!(
        out,
        "worker      {:>4}  {:>5}  {}",
        layout.worker_bits(),
        layout.worker_shift(),
        layout.max_worker_id()
    )?;
    writeln!(
        out,
        "sequence    {:>4}  {:>5}  {}",
        layout.sequence_bits(),
        0,
        layout.max_sequence()
    )?;
    writeln!(out, "ids per millisecond: {}", layout.ids_per_millisecond())?;

    let horizon = layout.horizon();
    writeln!(
        out,
        "horizon: {} ms (~{} days)",
        horizon.as_millis(),
        horizon.as_secs() / 86_400
    )?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_count_spreads_the_remainder() {
        assert_eq!(split_count(10, 3), vec![4, 3, 3]);
        assert_eq!(split_count(2, 2), vec![1, 1]);
        assert_eq!(split_count(0, 1), vec![0]);
        assert_eq!(split_count(7, 1), vec![7]);
    }
}
