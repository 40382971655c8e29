//! Resolve a crop rectangle.

use reframe_crop_core::controller::CropBoxController;
use reframe_crop_model::geometry::{AspectRatio, Bounds};

pub fn run(
    ratio: &str,
    width: f64,
    height: f64,
    left: Option<f64>,
    top: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    let ratio: AspectRatio = ratio
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid aspect ratio {ratio:?}: {e}"))?;
    let bounds = Bounds::new(width, height);
    if bounds.is_degenerate() {
        anyhow::bail!("Displayed bounds must be positive, got {width}x{height}");
    }

    let mut controller = CropBoxController::new(ratio, bounds);
    let rect = if left.is_some() || top.is_some() {
        let current = controller.rect();
        controller.apply_drag(left.unwrap_or(current.left), top.unwrap_or(current.top))
    } else {
        controller.rect()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&rect)?);
        return Ok(());
    }

    println!("Ratio {ratio} in {width}x{height}:");
    println!("  left:   {:.2}", rect.left);
    println!("  top:    {:.2}", rect.top);
    println!("  width:  {:.2}", rect.width);
    println!("  height: {:.2}", rect.height);

    let guides = rect.thirds_guides();
    println!(
        "  thirds: x = {:.2}, {:.2}; y = {:.2}, {:.2}",
        guides.verticals[0], guides.verticals[1], guides.horizontals[0], guides.horizontals[1]
    );

    Ok(())
}
