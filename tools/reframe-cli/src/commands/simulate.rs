//! Run a cropper session against a simulated player.

use std::path::PathBuf;
use std::time::Duration;

use reframe_common::config::AppConfig;
use reframe_crop_core::exporter::FileExportSink;
use reframe_crop_model::geometry::Bounds;
use reframe_session::{
    CropSession, ScheduledCommand, SessionCommand, SessionConfig, SessionDriver, SharedPreview,
    SharedViewport, SimulatedPlayer,
};

pub struct SimulateOptions {
    pub ratio: Option<String>,
    pub native: (u32, u32),
    pub display: (f64, f64),
    pub duration: f64,
    pub run_secs: f64,
    pub speed: f64,
    pub drag_left: Option<f64>,
    pub output: Option<PathBuf>,
    pub preview_png: Option<PathBuf>,
}

pub async fn run(config: &AppConfig, options: SimulateOptions) -> anyhow::Result<()> {
    if !options.run_secs.is_finite() || options.run_secs <= 0.0 {
        anyhow::bail!("--run-secs must be a positive number");
    }

    let mut session_config = SessionConfig::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
    if let Some(ratio) = &options.ratio {
        session_config.aspect_ratio = ratio
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid aspect ratio {ratio:?}: {e}"))?;
    }

    let (native_width, native_height) = options.native;
    let (display_width, display_height) = options.display;
    let viewport = SharedViewport::new(Bounds::new(display_width, display_height));
    let preview = SharedPreview::new();
    let player = SimulatedPlayer::new(native_width, native_height, options.duration);

    let preview_interval = session_config.preview_interval;
    let mut session = CropSession::new(session_config, Box::new(player), Box::new(viewport))
        .with_preview_sink(Box::new(preview.clone()));

    let run_for = Duration::from_secs_f64(options.run_secs);
    let mut script = vec![
        ScheduledCommand::new(
            Duration::ZERO,
            SessionCommand::SetPlaybackRate(options.speed),
        ),
        ScheduledCommand::new(Duration::ZERO, SessionCommand::Play),
    ];
    if let Some(left) = options.drag_left {
        let top = session.crop_rect().top;
        script.push(ScheduledCommand::new(
            run_for / 2,
            SessionCommand::DragTo { left, top },
        ));
    }

    println!(
        "Simulating {native_width}x{native_height} video displayed at {display_width}x{display_height}"
    );
    println!(
        "  Ratio {}, crop {:?}",
        session.aspect_ratio(),
        session.crop_rect().coordinates()
    );
    println!("  Running for {:.1}s at {}x...", options.run_secs, options.speed);

    let driver = SessionDriver::new(preview_interval).with_deadline(run_for);
    let stop_flag = driver.stop_flag();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping session");
            stop_flag.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    });

    let summary = driver
        .run(&mut session, script)
        .await
        .map_err(|e| anyhow::anyhow!("Session failed: {e}"))?;
    ctrl_c.abort();

    println!();
    println!("Session finished after {:.2}s", summary.elapsed.as_secs_f64());
    println!("  Ticks: {}", summary.ticks);
    println!(
        "  Commands: {} applied, {} rejected",
        summary.commands_applied, summary.commands_rejected
    );
    println!(
        "  Previews: {} rendered, {} skipped",
        summary.session.previews_rendered, summary.session.previews_skipped
    );
    println!("  Keyframes: {}", summary.session.keyframes);
    println!("  Transport: {}", session.transport().clock_label());

    let output_dir = options
        .output
        .unwrap_or_else(|| config.export.output_dir.clone());
    let mut sink = FileExportSink::new(output_dir);
    let bytes = session
        .export_json(&mut sink)
        .map_err(|e| anyhow::anyhow!("Failed to export keyframes: {e}"))?;
    if let Some(path) = sink.last_written() {
        println!("  Exported {bytes} bytes to: {}", path.display());
    }

    if let Some(path) = options.preview_png {
        let bitmap = preview
            .latest()
            .ok_or_else(|| anyhow::anyhow!("No preview frame was rendered"))?;
        let png = bitmap
            .to_png()
            .map_err(|e| anyhow::anyhow!("Failed to encode preview: {e}"))?;
        std::fs::write(&path, png)?;
        println!(
            "  Preview {}x{} written to: {}",
            bitmap.width(),
            bitmap.height(),
            path.display()
        );
    }

    Ok(())
}
