use core::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use flakeid::{Backoff, GeneratorConfig, Identity, Layout};

pub const EPOCH_MILLIS_ENV: &str = "FLAKEID_EPOCH_MILLIS";
pub const DATACENTER_BITS_ENV: &str = "FLAKEID_DATACENTER_BITS";
pub const WORKER_BITS_ENV: &str = "FLAKEID_WORKER_BITS";
pub const SEQUENCE_BITS_ENV: &str = "FLAKEID_SEQUENCE_BITS";
pub const DATACENTER_ID_ENV: &str = "FLAKEID_DATACENTER_ID";
pub const WORKER_ID_ENV: &str = "FLAKEID_WORKER_ID";
pub const CLOCK_ENV: &str = "FLAKEID_CLOCK";
pub const BACKOFF_ENV: &str = "FLAKEID_BACKOFF";
pub const GENERATOR_ENV: &str = "FLAKEID_GENERATOR";

/// Command-line arguments for the `flakeid` binary.
///
/// Every layout and identity setting can also be supplied through the
/// environment (or a `.env` file), so a deployment can pin its partition once
/// and call the tool without flags.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flakeid",
    version,
    about = "Generate, decode and inspect Snowflake-style 64-bit IDs"
)]
pub struct CliArgs {
    #[command(flatten)]
    pub settings: GeneratorArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Layout, identity and runtime settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GeneratorArgs {
    /// Reference instant in milliseconds since 1970-01-01 UTC.
    ///
    /// Defaults to 2019-01-01T00:00:00Z. Must not be in the future.
    #[arg(long, global = true, env = EPOCH_MILLIS_ENV, default_value_t = flakeid::DEFAULT_EPOCH.as_millis() as u64)]
    pub epoch_millis: u64,

    /// Width of the datacenter field, 0 to 10.
    #[arg(long, global = true, env = DATACENTER_BITS_ENV, default_value_t = flakeid::DEFAULT_DATACENTER_BITS)]
    pub datacenter_bits: u8,

    /// Width of the worker field, 0 to 10.
    #[arg(long, global = true, env = WORKER_BITS_ENV, default_value_t = flakeid::DEFAULT_WORKER_BITS)]
    pub worker_bits: u8,

    /// Width of the sequence field, 1 to 20.
    #[arg(long, global = true, env = SEQUENCE_BITS_ENV, default_value_t = flakeid::DEFAULT_SEQUENCE_BITS)]
    pub sequence_bits: u8,

    #[arg(long, global = true, env = DATACENTER_ID_ENV, default_value_t = 0)]
    pub datacenter_id: u64,

    #[arg(long, global = true, env = WORKER_ID_ENV, default_value_t = 0)]
    pub worker_id: u64,

    /// Time source used to stamp generated IDs.
    #[arg(long, global = true, env = CLOCK_ENV, value_enum, default_value_t = ClockArg::Monotonic)]
    pub clock: ClockArg,

    /// Generator implementation.
    #[arg(long, global = true, env = GENERATOR_ENV, value_enum, default_value_t = GeneratorArg::Lock)]
    pub generator: GeneratorArg,

    /// How to wait once a millisecond's sequence is used up.
    #[arg(long, global = true, env = BACKOFF_ENV, value_enum, default_value_t = BackoffArg::Spin)]
    pub backoff: BackoffArg,

    /// Pause between clock reads for `--backoff sleep`.
    #[arg(long, global = true, default_value_t = 50)]
    pub sleep_micros: u64,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate IDs and print them one per line.
    Generate {
        /// Total number of IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Number of threads sharing one generator.
        #[arg(short, long, default_value_t = 1)]
        threads: usize,
    },
    /// Split IDs into their fields.
    Decode {
        #[arg(required = true)]
        ids: Vec<u64>,

        /// Print one JSON object per ID instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the configured layout.
    Inspect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClockArg {
    System,
    Monotonic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorArg {
    Lock,
    Atomic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackoffArg {
    Spin,
    Yield,
    Sleep,
}

/// Validated settings the binary runs with.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub generator: GeneratorConfig,
    pub layout: Layout,
    pub identity: Identity,
    pub clock: ClockArg,
    pub kind: GeneratorArg,
    pub command: Command,
}

impl TryFrom<CliArgs> for RuntimeConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let GeneratorArgs {
            epoch_millis,
            datacenter_bits,
            worker_bits,
            sequence_bits,
            datacenter_id,
            worker_id,
            clock,
            generator: kind,
            backoff,
            sleep_micros,
        } = args.settings;

        let backoff = match backoff {
            BackoffArg::Spin => Backoff::Spin,
            BackoffArg::Yield => Backoff::Yield,
            BackoffArg::Sleep => {
                if sleep_micros == 0 {
                    bail!("--sleep-micros must be greater than 0");
                }
                Backoff::Sleep(Duration::from_micros(sleep_micros))
            }
        };

        let generator = GeneratorConfig::with_ids(datacenter_id, worker_id)
            .with_epoch(Duration::from_millis(epoch_millis))
            .with_bits(datacenter_bits, worker_bits, sequence_bits)
            .with_backoff(backoff);
        let (layout, identity) = generator.validate().context("invalid generator settings")?;

        if let Command::Generate { count, threads } = args.command {
            if threads == 0 {
                bail!("--threads must be greater than 0");
            }
            if threads > count.max(1) {
                bail!("--threads ({threads}) exceeds --count ({count})");
            }
        }

        Ok(Self {
            generator,
            layout,
            identity,
            clock,
            kind,
            command: args.command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<RuntimeConfig> {
        let args = CliArgs::try_parse_from(core::iter::once("flakeid").chain(args.iter().copied()))?;
        RuntimeConfig::try_from(args)
    }

    #[test]
    fn defaults_match_library_defaults() {
        let config = parse(&["inspect"]).unwrap();
        assert_eq!(config.generator, GeneratorConfig::default());
        assert_eq!(config.layout, Layout::default());
        assert_eq!(config.clock, ClockArg::Monotonic);
        assert_eq!(config.kind, GeneratorArg::Lock);
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let config = parse(&["generate", "-n", "8", "--worker-bits", "6", "--worker-id", "40"]).unwrap();
        assert_eq!(config.layout.worker_bits(), 6);
        assert_eq!(config.identity.worker_id(), 40);
        assert!(matches!(config.command, Command::Generate { count: 8, threads: 1 }));
    }

    #[test]
    fn sleep_backoff_uses_micros() {
        let config = parse(&["--backoff", "sleep", "--sleep-micros", "200", "inspect"]).unwrap();
        assert_eq!(config.generator.backoff, Backoff::Sleep(Duration::from_micros(200)));
    }

    #[test]
    fn rejects_out_of_range_layout() {
        assert!(parse(&["--sequence-bits", "0", "inspect"]).is_err());
        assert!(parse(&["--datacenter-bits", "11", "inspect"]).is_err());
        assert!(parse(&["--worker-id", "16", "inspect"]).is_err());
    }

    #[test]
    fn rejects_bad_thread_counts() {
        assert!(parse(&["generate", "--threads", "0"]).is_err());
        assert!(parse(&["generate", "-n", "2", "--threads", "3"]).is_err());
    }

    #[test]
    fn decode_requires_an_id() {
        assert!(parse(&["decode"]).is_err());
        let config = parse(&["decode", "1", "2"]).unwrap();
        assert!(matches!(config.command, Command::Decode { ref ids, json: false } if ids == &[1, 2]));
    }
}
