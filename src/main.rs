use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use loadwatch::{Report, Sampler, SamplerConfig};

#[derive(Parser, Debug)]
#[command(name = "loadwatch")]
#[command(about = "Sample a sysfs device load file at high frequency")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load file to sample (overrides config)
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Sampling interval in seconds (overrides config)
    #[arg(short, long)]
    interval: Option<f64>,

    /// How long to sample, in seconds
    #[arg(short, long, default_value = "5")]
    duration: f64,

    /// Print a single reading and exit
    #[arg(long, conflicts_with_all = ["duration", "export"])]
    once: bool,

    /// Write the session report as JSON
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = SamplerConfig::load(args.config.as_deref())?;
    if let Some(source) = args.source {
        config.source_path = source;
    }
    if let Some(interval) = args.interval {
        config.interval_secs = interval;
    }

    let sampler = Sampler::from_config(&config)?;

    if args.once {
        println!("{}", sampler.current_utilization());
        return Ok(());
    }

    let duration = session_duration(args.duration)?;
    run_session(&sampler, duration)?;
    print_stats(&sampler);

    if let Some(export_path) = args.export {
        Report::from_sampler(&sampler)
            .write_json(&export_path)
            .context("Export failed")?;
        println!("Exported session report to: {}", export_path.display());
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn session_duration(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        bail!("Duration must be positive, got {}", secs);
    }
    Duration::try_from_secs_f64(secs).with_context(|| format!("Duration {} out of range", secs))
}

/// Run one session for `duration`, blocking the caller.
fn run_session(sampler: &Sampler, duration: Duration) -> Result<()> {
    info!(
        source = sampler.source(),
        interval_secs = sampler.interval().as_secs_f64(),
        "Sampling for {:.1}s",
        duration.as_secs_f64()
    );
    sampler.start()?;
    std::thread::sleep(duration);
    sampler.stop()?;
    Ok(())
}

fn print_stats(sampler: &Sampler) {
    let stats = sampler.stats();
    println!("Source:   {}", sampler.source());
    println!("Samples:  {}", stats.count);
    println!("Mean:     {:.1}% ({:.1})", stats.mean_percent(), stats.mean);
    println!("Max:      {:.1}% ({})", stats.max_percent(), stats.max);
    println!("Std dev:  {:.1}% ({:.1})", stats.stddev / 10.0, stats.stddev);
}
