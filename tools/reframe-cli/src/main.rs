//! Reframe CLI: inspect crop geometry and run simulated cropper sessions.
//!
//! Usage:
//!   reframe resolve <RATIO>    Resolve a crop rectangle inside displayed bounds
//!   reframe presets            Show aspect-ratio and playback-speed presets
//!   reframe simulate           Run a cropper session against a simulated player

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reframe_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reframe",
    about = "Aspect-ratio crop geometry and keyframe recording",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the XDG location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the crop rectangle for a ratio inside displayed bounds
    Resolve {
        /// Aspect ratio as W:H
        ratio: String,

        /// Displayed video width
        #[arg(long, default_value = "640")]
        width: f64,

        /// Displayed video height
        #[arg(long, default_value = "360")]
        height: f64,

        /// Proposed left edge after a drag
        #[arg(long)]
        left: Option<f64>,

        /// Proposed top edge after a drag
        #[arg(long)]
        top: Option<f64>,

        /// Print the rectangle as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show aspect-ratio and playback-speed presets
    Presets,

    /// Run a cropper session against a simulated player and export keyframes
    Simulate {
        /// Aspect ratio as W:H (defaults to the configured ratio)
        #[arg(long)]
        ratio: Option<String>,

        /// Native video width
        #[arg(long, default_value = "1920")]
        native_width: u32,

        /// Native video height
        #[arg(long, default_value = "1080")]
        native_height: u32,

        /// Displayed video width
        #[arg(long, default_value = "640")]
        display_width: f64,

        /// Displayed video height
        #[arg(long, default_value = "360")]
        display_height: f64,

        /// Media duration (seconds)
        #[arg(long, default_value = "30")]
        duration: f64,

        /// How long to run the session (seconds of wall time)
        #[arg(long, default_value = "5")]
        run_secs: f64,

        /// Playback speed multiplier
        #[arg(long, default_value = "1")]
        speed: f64,

        /// Drag the crop to this left edge halfway through the run
        #[arg(long)]
        drag_left: Option<f64>,

        /// Output directory for the keyframe export
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the last preview frame as PNG
        #[arg(long)]
        preview_png: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    reframe_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Resolve {
            ratio,
            width,
            height,
            left,
            top,
            json,
        } => commands::resolve::run(&ratio, width, height, left, top, json),
        Commands::Presets => commands::presets::run(&config),
        Commands::Simulate {
            ratio,
            native_width,
            native_height,
            display_width,
            display_height,
            duration,
            run_secs,
            speed,
            drag_left,
            output,
            preview_png,
        } => {
            let options = commands::simulate::SimulateOptions {
                ratio,
                native: (native_width, native_height),
                display: (display_width, display_height),
                duration,
                run_secs,
                speed,
                drag_left,
                output,
                preview_png,
            };
            commands::simulate::run(&config, options).await
        }
    }
}
