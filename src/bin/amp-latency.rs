//! Run the latency probes against the simulated AMP platform.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};

use amp_latency::output::{format_report, to_json_pretty};
use amp_latency::sim::SimPlatform;
use amp_latency::{Config, LatencyProbe, LatencyReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Kick plus message echo through shared memory.
    Shmem,
    /// Bare kick and kick-back.
    Ipi,
    /// Both, IPI first.
    All,
}

/// Measure IPI and shared-memory round-trip latency between two cores.
#[derive(Debug, Parser)]
#[command(name = "amp-latency", version)]
struct Args {
    /// Which probe to run.
    #[arg(long, value_enum, default_value_t = Mode::Shmem)]
    mode: Mode,

    /// Round trips per message size.
    #[arg(long)]
    iterations: Option<usize>,

    /// Comma separated message sizes in bytes, header included.
    #[arg(long)]
    sizes: Option<String>,

    /// Timer input clock in Hz.
    #[arg(long)]
    clock_hz: Option<u64>,

    /// Fixed delay of the simulated remote before each reply.
    #[arg(long, default_value_t = 0)]
    remote_delay_us: u64,

    /// Upper bound of a random extra delay of the simulated remote.
    #[arg(long, default_value_t = 0)]
    jitter_us: u64,

    /// Print the reports as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Skip the preflight checks.
    #[arg(long)]
    no_preflight: bool,
}

fn enable_tracing() -> anyhow::Result<()> {
    let filter = if let Ok(filter) = std::env::var("AMP_LATENCY_LOG") {
        tracing_subscriber::EnvFilter::try_new(filter).context("invalid AMP_LATENCY_LOG")?
    } else {
        tracing_subscriber::EnvFilter::default()
            .add_directive(tracing::metadata::LevelFilter::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .try_init()
        .map_err(|e| anyhow::anyhow!(e).context("failed to enable tracing"))?;

    Ok(())
}

fn config_from(args: &Args) -> anyhow::Result<Config> {
    let mut config = Config::from_env();
    if let Some(n) = args.iterations {
        config.iterations = n;
    }
    if let Some(list) = &args.sizes {
        config.sizes = amp_latency::parse_sizes(list)
            .with_context(|| format!("invalid size list `{list}`"))?;
    }
    if let Some(hz) = args.clock_hz {
        config.clock_hz = hz;
    }
    config.preflight = !args.no_preflight;
    Ok(config)
}

fn run(args: &Args) -> anyhow::Result<Vec<LatencyReport>> {
    let config = config_from(args)?;
    let platform = SimPlatform::builder()
        .config(&config)
        .ttc_hz(config.clock_hz)
        .remote_delay(Duration::from_micros(args.remote_delay_us))
        .remote_jitter(Duration::from_micros(args.jitter_us), rand::random())
        .build()
        .context("failed to start simulated platform")?;
    let peripherals = platform.peripherals()?;
    let probe = LatencyProbe::with_config(config);

    let mut reports = Vec::new();
    if matches!(args.mode, Mode::Ipi | Mode::All) {
        reports.push(probe.ipi_latency(&peripherals)?);
        // The remote must have seen the final kick before the next run starts.
        if !platform.wait_finished(1, Duration::from_secs(1)) {
            anyhow::bail!("remote did not leave the ipi demo loop");
        }
    }
    if matches!(args.mode, Mode::Shmem | Mode::All) {
        reports.push(probe.shmem_latency(&peripherals)?);
    }
    Ok(reports)
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = enable_tracing() {
        eprintln!("amp-latency: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(reports) => {
            for report in &reports {
                if args.json {
                    match to_json_pretty(report) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("amp-latency: failed to serialize report: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    print!("{}", format_report(report));
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("amp-latency: {e:#}");
            ExitCode::FAILURE
        }
    }
}
