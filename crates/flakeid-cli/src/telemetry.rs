//! Log output for the `flakeid` binary.
//!
//! Events go to stderr through `tracing_subscriber::fmt` so that stdout carries
//! nothing but IDs and can be piped. The level defaults to `info` and follows
//! `RUST_LOG` when set, e.g. `RUST_LOG=flakeid=trace` to see every generator
//! call.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_target(false),
        )
        .try_init()?;
    Ok(())
}
