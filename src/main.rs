// SPDX-License-Identifier: MPL-2.0
use animated_frames::animated::{AnimatedImage, CacheOptions};
use animated_frames::config::{self, Config};
use animated_frames::diagnostics::{CacheStats, MemoryBudget, MemoryMonitor, MemoryShare, SamplingInterval};
use animated_frames::playback::{spawn_ticker, Player, TickTarget, WeakProxy};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
animated-frames - play an animated GIF or WebP through the frame cache

USAGE:
  animated-frames [OPTIONS] <FILE>

OPTIONS:
  --budget-mb N     Decoded-frame memory budget in megabytes
  --max-frames N    Hard cap on resident frames (0 = none)
  --play-secs S     How long to play (default 3)
  --config PATH     Settings file (default: platform config dir)
  -h, --help        Print this help

Set RUST_LOG (e.g. RUST_LOG=debug) for cache logs.
";

const TICK_INTERVAL: Duration = Duration::from_millis(16);

struct Args {
    file: PathBuf,
    budget_mb: Option<u32>,
    max_frames: Option<usize>,
    play_secs: f64,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Option<Args>, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(None);
    }

    let parsed = Args {
        budget_mb: args.opt_value_from_str("--budget-mb")?,
        max_frames: args.opt_value_from_str("--max-frames")?,
        play_secs: args.opt_value_from_str("--play-secs")?.unwrap_or(3.0),
        config: args.opt_value_from_str("--config")?,
        file: args.free_from_str()?,
    };
    Ok(Some(parsed))
}

fn load_config(args: &Args) -> animated_frames::Result<Config> {
    let mut config = match &args.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };
    if args.budget_mb.is_some() {
        config.memory_budget_mb = args.budget_mb;
    }
    if args.max_frames.is_some() {
        config.max_cached_frames = args.max_frames;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}\n\n{HELP}");
            return ExitCode::from(2);
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args)?;
    let configured_budget = config.memory_budget().as_bytes();

    let stats = Arc::new(CacheStats::new());
    let options = CacheOptions::from(&config).with_observer(stats.clone());
    let image = Arc::new(AnimatedImage::open_with_options(&args.file, options)?);

    println!("file:        {}", args.file.display());
    println!("codec:       {}", image.codec_name());
    println!(
        "canvas:      {}x{}",
        image.canvas_size().width,
        image.canvas_size().height
    );
    println!("frames:      {}", image.frame_count());
    println!("duration:    {:?}", image.total_duration());
    match image.loop_count() {
        0 => println!("loops:       forever"),
        n => println!("loops:       {n}"),
    }
    println!("window:      {}", image.current_window_size());

    let (budget_tx, budget_rx) = crossbeam_channel::bounded::<MemoryBudget>(1);
    let sampling_ms = u64::try_from(config.memory_sampling_interval().as_millis()).unwrap_or(u64::MAX);
    let _monitor = MemoryMonitor::start(
        SamplingInterval::new(sampling_ms),
        MemoryShare::new(config.system_memory_percent()),
        budget_tx,
    )?;

    let player = Arc::new(Player::new(Arc::clone(&image)));
    let ticker = spawn_ticker(WeakProxy::new(&player), TICK_INTERVAL);

    let play_for = Duration::try_from_secs_f64(args.play_secs).unwrap_or(Duration::from_secs(3));
    let deadline = tokio::time::Instant::now() + play_for;
    let mut poll = tokio::time::interval(Duration::from_millis(100));

    while tokio::time::Instant::now() < deadline && !player.is_finished() {
        poll.tick().await;
        // The configured budget stays an upper bound.
        if let Some(sample) = budget_rx.try_iter().last() {
            let budget = sample.budget_bytes.min(configured_budget);
            if budget != image.memory_budget() {
                image.set_memory_budget(budget);
            }
        }
    }

    let frames_shown = player.frames_shown();
    let stalls = player.stalls();
    let loops = player.loops_completed();
    drop(player);
    ticker.await?;

    let snapshot = stats.snapshot();
    println!("shown:       {frames_shown} frames, {stalls} stalls, {loops} loops");
    println!(
        "cache:       {} hits, {} misses ({:.1}% hit rate), {} refill steps",
        snapshot.hits,
        snapshot.misses,
        snapshot.hit_rate(),
        snapshot.refills
    );
    println!("resident:    {:?}", image.resident_indices());

    Ok(())
}
