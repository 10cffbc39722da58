//! beatpad - terminal drum machine
//!
//! Run with: cargo run -- --bpm 96 --log beatpad.log
//! Bounce to a file: cargo run -- --bounce beat.wav --bars 8

mod app;
mod bounce;
mod ui;
mod wav;

use std::{fs::File, path::PathBuf, sync::Arc};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "beatpad", version, about = "Procedural drum machine")]
struct Args {
    /// Starting tempo
    #[arg(long, default_value_t = 120)]
    bpm: u32,

    /// Render the pattern offline to this WAV file instead of playing live
    #[arg(long, value_name = "WAV")]
    bounce: Option<PathBuf>,

    /// Bars to bounce
    #[arg(long, default_value_t = 4)]
    bars: u32,

    /// Generate the bounced pattern from a prompt instead of the demo beat
    #[arg(long)]
    prompt: Option<String>,

    /// Seed for generated patterns
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Where live recordings are written
    #[arg(long, value_name = "DIR", default_value = ".")]
    recordings: PathBuf,

    /// Write debug logs to this file
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();

    match &args.log {
        Some(path) => {
            let file = File::create(path)
                .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_max_level(Level::DEBUG)
                .init();
        }
        // The live UI owns the terminal, so only a bounce logs to stderr
        None if args.bounce.is_some() => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_max_level(Level::INFO)
                .init();
        }
        None => {}
    }

    match &args.bounce {
        Some(path) => bounce::run(
            path,
            &bounce::BounceOptions {
                bpm: args.bpm,
                bars: args.bars,
                prompt: args.prompt.clone(),
                seed: args.seed,
            },
        ),
        None => app::run(args.bpm, args.seed, args.recordings.clone()),
    }
}
