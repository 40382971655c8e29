//! Show the configured presets.

use reframe_common::config::{config_file_path, AppConfig};
use reframe_crop_model::geometry::AspectRatio;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Config: {}", config_file_path().display());
    println!();

    let cropper = &config.cropper;
    println!("Aspect ratios:");
    for preset in &cropper.aspect_ratio_presets {
        let marker = if *preset == cropper.default_aspect_ratio {
            " (default)"
        } else {
            ""
        };
        match preset.parse::<AspectRatio>() {
            Ok(ratio) => println!("  {:<6} {:.4}{marker}", ratio.to_string(), ratio.value()),
            Err(e) => println!("  {preset:<6} invalid: {e}"),
        }
    }
    println!();

    println!("Playback speeds:");
    for speed in &cropper.playback_speed_presets {
        let marker = if *speed == 1.0 { " (default)" } else { "" };
        println!("  {speed}x{marker}");
    }
    println!();

    println!("Sampling:");
    println!("  Preview every {} ms", config.sampling.preview_interval_ms);
    println!("  Keyframe every {} ms", config.sampling.keyframe_interval_ms);

    Ok(())
}
