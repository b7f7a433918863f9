use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use kline_player::{
    KlineRequest, KlineViewer, PlayerError, config::PlayerConfig, playback::TokioScheduler,
    session::Frame,
};
use market_data::{
    catalog,
    models::{bar_series::BarSeries, timeframe::TimeFrame},
    providers::{
        DataProvider, file::KlineFileProvider, memory::MemoryProvider,
        resampling::ResamplingProvider,
    },
    wire::decode_klines,
};

#[derive(Parser)]
#[command(author, version, about = "Replay historical K-lines with moving averages")]
struct Cli {
    /// Path to a TOML config file (falls back to $KLINE_PLAYER_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a range in real time, one line per revealed bar
    Play {
        /// Kline JSON export at the base interval (5m for 15m, 1h for 4h/1d/1w).
        /// Without it, bars are read from the configured data directory.
        #[arg(long, value_name = "JSON")]
        file: Option<PathBuf>,

        /// Exchange symbol, e.g. "BTCUSDT"
        #[arg(long)]
        symbol: Option<String>,

        /// Bar interval: 5m, 15m, 1h, 4h, 1d or 1w
        #[arg(long)]
        interval: Option<TimeFrame>,

        /// Start datetime in RFC 3339 format (e.g. "2024-01-01T00:00:00Z")
        #[arg(long)]
        start: DateTime<Utc>,

        /// End datetime in RFC 3339 format, exclusive
        #[arg(long)]
        end: DateTime<Utc>,

        /// Bars revealed per second
        #[arg(long)]
        speed: Option<f64>,
    },

    /// List supported symbols and intervals
    Catalog {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    shared_utils::logging::init("info");
    let cli = Cli::parse();
    let config = PlayerConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Catalog { json } => print_catalog(json),
        Commands::Play {
            file,
            symbol,
            interval,
            start,
            end,
            speed,
        } => {
            let request = KlineRequest {
                symbol: symbol.unwrap_or_else(|| config.data.symbol.clone()),
                timeframe: interval.unwrap_or(config.data.interval),
                start,
                end,
            };
            if !catalog::is_supported_symbol(&request.symbol) {
                tracing::warn!(symbol = %request.symbol, "symbol is not in the catalog");
            }
            let speed = speed.unwrap_or(config.playback.speed);

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start the tokio runtime")?;
            runtime.block_on(play(&config, file, request, speed))
        }
    }
}

async fn play(
    config: &PlayerConfig,
    file: Option<PathBuf>,
    request: KlineRequest,
    speed: f64,
) -> Result<()> {
    let provider: Box<dyn DataProvider> = match file {
        Some(path) => {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let bars = decode_klines(&raw)
                .with_context(|| format!("failed to decode {}", path.display()))?;
            let base = request.timeframe.base_timeframe();
            tracing::info!(path = %path.display(), bars = bars.len(), %base, "loaded kline file");
            let memory = MemoryProvider::new()
                .with_series(BarSeries::new(request.symbol.clone(), base, bars));
            Box::new(ResamplingProvider::new(memory))
        }
        None => Box::new(ResamplingProvider::new(KlineFileProvider::new(
            config.data.dir.clone(),
        ))),
    };

    let (scheduler, mut ticks) = TokioScheduler::new();
    let mut viewer = KlineViewer::new(scheduler, config.moving_averages);
    viewer.set_speed(speed)?;
    viewer.load_range(provider.as_ref(), request).await?;
    print_frame(&viewer.frame());

    match viewer.play() {
        Ok(()) => {}
        Err(PlayerError::NothingToPlay) => {
            println!("{}", viewer.status_message());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    while viewer.controller().is_running() {
        tokio::select! {
            Some(id) = ticks.recv() => {
                if viewer.on_timer(id).is_progress() {
                    print_frame(&viewer.frame());
                }
            }
            _ = &mut ctrl_c => {
                viewer.stop();
            }
        }
    }
    println!("{}", viewer.status_message());
    Ok(())
}

fn print_frame(frame: &Frame<'_>) {
    let Some(bar) = frame.last_bar() else {
        return;
    };
    let mut line = format!(
        "{} O:{} H:{} L:{} C:{} V:{}",
        bar.open_time.format("%Y-%m-%d %H:%M"),
        bar.open,
        bar.high,
        bar.low,
        bar.close,
        bar.volume
    );
    for (label, points) in &frame.overlays {
        if let Some(p) = points.last() {
            line.push_str(&format!(" | {label}={:.4}", p.value));
        }
    }
    line.push_str(&format!(" | {:>3}%", frame.progress_percent));
    println!("{line}");
}

fn print_catalog(json: bool) -> Result<()> {
    let symbols = catalog::supported_symbols();
    let intervals = catalog::supported_timeframes();
    if json {
        let doc = serde_json::json!({ "symbols": symbols, "intervals": intervals });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("Symbols:");
    for s in &symbols {
        println!("  {:<10} {}", s.value, s.label);
    }
    println!("Intervals:");
    for i in &intervals {
        println!("  {:<10} {}", i.value, i.label);
    }
    Ok(())
}
