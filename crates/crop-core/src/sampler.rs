//! Live preview sampling.
//!
//! Each preview tick crops the current video frame to the crop rectangle,
//! scaled from displayed to native pixels, and resizes the result back to
//! the rectangle's displayed size. The newest bitmap replaces the previous
//! one; nothing is queued.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_crop_model::geometry::{CropRect, DisplayScale};

/// How much decoded data the media has for the current position.
///
/// Mirrors the media-element ready states; frames can be sampled from
/// [`ReadyState::HaveCurrentData`] upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ReadyState {
    #[default]
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    pub fn has_frame(self) -> bool {
        self >= ReadyState::HaveCurrentData
    }
}

/// Anything that can hand out the frame at the current playback position.
pub trait FrameSource {
    fn ready_state(&self) -> ReadyState;

    /// The decoded frame at native resolution.
    fn current_frame(&self) -> Option<&RgbaImage>;
}

/// The most recent cropped preview.
#[derive(Debug, Clone)]
pub struct PreviewBitmap {
    image: RgbaImage,
    rect: CropRect,
}

impl PreviewBitmap {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// The crop rectangle this bitmap was rendered from.
    pub fn rect(&self) -> CropRect {
        self.rect
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode as PNG for display surfaces.
    pub fn to_png(&self) -> ReframeResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        PngEncoder::new(&mut buf)
            .write_image(
                self.image.as_raw(),
                self.image.width(),
                self.image.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| ReframeError::preview(format!("PNG encoding failed: {e}")))?;
        Ok(buf.into_inner())
    }
}

/// Render the crop of `source` described by `rect` at `scale`.
///
/// The source region `[left, top, width, height] * scale` is clipped to
/// the frame; parts of the region outside the frame stay transparent.
/// Output dimensions are the rectangle's displayed size, truncated to
/// whole pixels.
pub fn render_preview<S: FrameSource + ?Sized>(
    source: &S,
    rect: &CropRect,
    scale: Option<DisplayScale>,
) -> ReframeResult<PreviewBitmap> {
    let ready = source.ready_state();
    if !ready.has_frame() {
        return Err(ReframeError::not_ready(format!("ready state {ready:?}")));
    }
    let frame = source
        .current_frame()
        .ok_or_else(|| ReframeError::not_ready("no decoded frame"))?;

    if rect.is_degenerate() {
        return Err(ReframeError::degenerate(rect.width, rect.height));
    }
    let out_w = rect.width as u32;
    let out_h = rect.height as u32;
    if out_w == 0 || out_h == 0 {
        return Err(ReframeError::degenerate(rect.width, rect.height));
    }

    let scale =
        scale.ok_or_else(|| ReframeError::not_ready("display-to-source scale unknown"))?;
    let src = rect.scaled(scale);

    let (frame_w, frame_h) = (frame.width() as f64, frame.height() as f64);
    let clip_left = src.left.max(0.0);
    let clip_top = src.top.max(0.0);
    let clip_right = src.right().min(frame_w);
    let clip_bottom = src.bottom().min(frame_h);

    if clip_right <= clip_left || clip_bottom <= clip_top {
        tracing::trace!(?src, frame_w, frame_h, "Crop region outside frame");
        return Ok(PreviewBitmap {
            image: RgbaImage::new(out_w, out_h),
            rect: *rect,
        });
    }

    let x0 = clip_left.floor() as u32;
    let y0 = clip_top.floor() as u32;
    let x1 = (clip_right.ceil() as u32).min(frame.width());
    let y1 = (clip_bottom.ceil() as u32).min(frame.height());
    let region = imageops::crop_imm(frame, x0, y0, x1 - x0, y1 - y0).to_image();

    let fully_inside =
        src.left >= 0.0 && src.top >= 0.0 && src.right() <= frame_w && src.bottom() <= frame_h;
    if fully_inside {
        let image = imageops::resize(&region, out_w, out_h, FilterType::Triangle);
        return Ok(PreviewBitmap { image, rect: *rect });
    }

    // Partially clipped: place the visible part where it would land on
    // the destination canvas.
    let kx = out_w as f64 / src.width;
    let ky = out_h as f64 / src.height;
    let dest_x = ((clip_left - src.left) * kx).round() as i64;
    let dest_y = ((clip_top - src.top) * ky).round() as i64;
    let dest_w = (((clip_right - clip_left) * kx).round() as u32).max(1);
    let dest_h = (((clip_bottom - clip_top) * ky).round() as u32).max(1);

    let visible = imageops::resize(&region, dest_w, dest_h, FilterType::Triangle);
    let mut image = RgbaImage::new(out_w, out_h);
    imageops::replace(&mut image, &visible, dest_x, dest_y);
    Ok(PreviewBitmap { image, rect: *rect })
}

/// Single-slot preview sampler.
#[derive(Debug, Default)]
pub struct FrameSampler {
    latest: Option<PreviewBitmap>,
    frames_rendered: u64,
    frames_skipped: u64,
}

impl FrameSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample one preview frame.
    ///
    /// Returns the new bitmap, or `None` when the tick was skipped; a
    /// skipped tick leaves the previous bitmap in place.
    pub fn capture<S: FrameSource + ?Sized>(
        &mut self,
        source: &S,
        rect: &CropRect,
        scale: Option<DisplayScale>,
    ) -> Option<&PreviewBitmap> {
        match render_preview(source, rect, scale) {
            Ok(bitmap) => {
                self.frames_rendered += 1;
                self.latest = Some(bitmap);
                self.latest.as_ref()
            }
            Err(e) => {
                self.frames_skipped += 1;
                if e.is_skippable() {
                    tracing::debug!(error = %e, "Preview tick skipped");
                } else {
                    tracing::warn!(error = %e, "Preview tick failed");
                }
                None
            }
        }
    }

    /// The last rendered bitmap.
    pub fn latest(&self) -> Option<&PreviewBitmap> {
        self.latest.as_ref()
    }

    /// Forget the last bitmap (new session).
    pub fn reset(&mut self) {
        self.latest = None;
        self.frames_rendered = 0;
        self.frames_skipped = 0;
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Frame whose red channel encodes x and green channel encodes y.
    struct GradientSource {
        frame: RgbaImage,
        ready: ReadyState,
    }

    impl GradientSource {
        fn new(width: u32, height: u32) -> Self {
            let frame = RgbaImage::from_fn(width, height, |x, y| {
                Rgba([
                    (x * 255 / (width - 1)) as u8,
                    (y * 255 / (height - 1)) as u8,
                    0,
                    255,
                ])
            });
            Self {
                frame,
                ready: ReadyState::HaveEnoughData,
            }
        }
    }

    impl FrameSource for GradientSource {
        fn ready_state(&self) -> ReadyState {
            self.ready
        }

        fn current_frame(&self) -> Option<&RgbaImage> {
            Some(&self.frame)
        }
    }

    fn scale_1_5() -> Option<DisplayScale> {
        DisplayScale::from_widths(960, 640.0)
    }

    #[test]
    fn test_output_has_displayed_size() {
        let source = GradientSource::new(960, 540);
        let mut sampler = FrameSampler::new();
        let rect = CropRect::new(100.0, 0.0, 202.5, 360.0);

        let bitmap = sampler.capture(&source, &rect, scale_1_5()).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (202, 360));
        assert_eq!(bitmap.rect(), rect);
        assert_eq!(sampler.frames_rendered(), 1);
    }

    #[test]
    fn test_samples_scaled_source_region() {
        let source = GradientSource::new(960, 540);
        let rect = CropRect::new(100.0, 0.0, 202.5, 360.0);
        let bitmap = render_preview(&source, &rect, scale_1_5()).unwrap();

        // Source region spans x in [150, 453.75]; its centre is ~301.9.
        let centre = bitmap.image().get_pixel(101, 180);
        let expected_red = 301.9 / 959.0 * 255.0;
        assert!(
            (centre[0] as f64 - expected_red).abs() <= 3.0,
            "red {} vs {expected_red}",
            centre[0]
        );
        let left_edge = bitmap.image().get_pixel(0, 180);
        assert!((left_edge[0] as f64 - 150.0 / 959.0 * 255.0).abs() <= 3.0);
    }

    #[test]
    fn test_zero_rect_is_skipped_and_keeps_slot() {
        let source = GradientSource::new(960, 540);
        let mut sampler = FrameSampler::new();
        sampler
            .capture(&source, &CropRect::new(0.0, 0.0, 90.0, 160.0), scale_1_5())
            .unwrap();

        assert!(sampler
            .capture(&source, &CropRect::ZERO, scale_1_5())
            .is_none());
        assert_eq!(sampler.latest().unwrap().width(), 90);
        assert_eq!(sampler.frames_skipped(), 1);
    }

    #[test]
    fn test_not_ready_source_is_skipped() {
        let mut source = GradientSource::new(64, 36);
        source.ready = ReadyState::HaveMetadata;
        let mut sampler = FrameSampler::new();

        let rect = CropRect::new(0.0, 0.0, 9.0, 16.0);
        assert!(sampler.capture(&source, &rect, scale_1_5()).is_none());
        assert!(sampler.latest().is_none());

        let err = render_preview(&source, &rect, scale_1_5()).unwrap_err();
        assert!(matches!(err, ReframeError::NotReady { .. }));
    }

    #[test]
    fn test_missing_scale_is_not_ready() {
        let source = GradientSource::new(64, 36);
        let err =
            render_preview(&source, &CropRect::new(0.0, 0.0, 9.0, 16.0), None).unwrap_err();
        assert!(matches!(err, ReframeError::NotReady { .. }));
    }

    #[test]
    fn test_sub_pixel_rect_is_degenerate() {
        let source = GradientSource::new(64, 36);
        let err = render_preview(
            &source,
            &CropRect::new(0.0, 0.0, 0.5, 16.0),
            Some(DisplayScale::IDENTITY),
        )
        .unwrap_err();
        assert!(matches!(err, ReframeError::DegenerateGeometry { .. }));
    }

    #[test]
    fn test_region_past_frame_edge_is_transparent() {
        // Hard-coded 1.5 on a frame that is displayed at native size pushes
        // the region past the right edge.
        let source = GradientSource::new(100, 100);
        let rect = CropRect::new(50.0, 0.0, 40.0, 40.0);
        let bitmap = render_preview(&source, &rect, DisplayScale::new(1.5)).unwrap();

        assert_eq!((bitmap.width(), bitmap.height()), (40, 40));
        assert_eq!(bitmap.image().get_pixel(1, 1)[3], 255);
        assert_eq!(bitmap.image().get_pixel(39, 1)[3], 0);
    }

    #[test]
    fn test_png_encoding() {
        let source = GradientSource::new(64, 36);
        let bitmap = render_preview(
            &source,
            &CropRect::new(0.0, 0.0, 18.0, 32.0),
            Some(DisplayScale::IDENTITY),
        )
        .unwrap();
        let png = bitmap.to_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
