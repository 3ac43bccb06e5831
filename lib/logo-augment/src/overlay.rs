//! Logo placement and alpha compositing.
//!
//! The logo is placed at a random position that keeps a 5% margin between the
//! logo and the right/bottom border of the canvas, then blended channel by
//! channel as `(1 - mask) * background + mask * logo`, where
//! `mask = alpha / 255 * transparency`.

use crate::{
    AugmentError, Result,
    transform::{Canvas, CanvasPixel},
};
use derivative::Derivative;
use derive_setters::Setters;
use image::RgbaImage;
use rand::Rng;

/// Logo footprint including the margin, as a percentage of the logo size.
const MARGIN_PERCENT: u64 = 105;

/// Slack for decimal range ends such as `0.29 * 100 = 28.999999999999996`.
const PERCENT_EPSILON: f64 = 1e-9;

/// Where the logo ended up on the canvas. `x2`/`y2` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PlacementRect {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn to_array(&self) -> [u32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Transparency applied uniformly on top of the logo's own alpha channel
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct TransparencyConfig {
    /// A transparency is drawn from `[min, max]` only when a uniform draw
    /// exceeds this value, otherwise the logo stays fully opaque.
    #[derivative(Default(value = "0.5"))]
    pub threshold: f64,

    #[derivative(Default(value = "0.5"))]
    pub min: f64,

    #[derivative(Default(value = "1.0"))]
    pub max: f64,
}

impl TransparencyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never draws a transparency: the logo is always pasted opaque.
    pub fn opaque() -> Self {
        Self::default().with_threshold(1.0)
    }

    pub fn with_range(self, min: f64, max: f64) -> Self {
        self.with_min(min).with_max(max)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(AugmentError::InvalidConfig(format!(
                "transparency threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }

        for value in [self.min, self.max] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(AugmentError::InvalidConfig(format!(
                    "transparency range values must be in (0, 1], got [{}, {}]",
                    self.min, self.max
                )));
            }
        }

        if self.min > self.max {
            return Err(AugmentError::InvalidConfig(format!(
                "transparency range min {} is greater than max {}",
                self.min, self.max
            )));
        }

        if self.percent_bounds().is_none() {
            return Err(AugmentError::InvalidConfig(format!(
                "transparency range [{}, {}] contains no multiple of 0.01",
                self.min, self.max
            )));
        }

        Ok(())
    }

    /// Smallest and largest whole percentages inside `[min, max]`.
    fn percent_bounds(&self) -> Option<(u32, u32)> {
        let low = (self.min * 100.0 - PERCENT_EPSILON).ceil().max(1.0);
        let high = (self.max * 100.0 + PERCENT_EPSILON).floor().min(100.0);

        (low <= high).then_some((low as u32, high as u32))
    }

    /// Draws the transparency factor for one logo at 1/100 granularity.
    ///
    /// # Panics
    /// If the range holds no multiple of 0.01, which [`Self::validate`] rejects.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let mut factor = 1.0;

        if rng.random::<f64>() > self.threshold {
            let Some((low, high)) = self.percent_bounds() else {
                panic!(
                    "transparency range [{}, {}] contains no multiple of 0.01",
                    self.min, self.max
                );
            };
            factor = rng.random_range(low..=high) as f64 / 100.0;
        }

        assert!(
            factor > 0.0 && factor <= 1.0,
            "transparency factor {factor} out of (0, 1]"
        );

        factor
    }
}

/// Result of compositing a logo onto a canvas.
#[derive(Debug, Clone)]
pub struct Overlay<P: CanvasPixel> {
    pub image: Canvas<P>,
    pub rect: PlacementRect,
    pub transparency: f64,
}

/// Free placement range along one axis once the logo plus margin is taken out.
pub fn allowed_range(logo_len: u32, canvas_len: u32) -> i64 {
    let footprint = (logo_len as u64 * MARGIN_PERCENT).div_ceil(100);
    canvas_len as i64 - footprint as i64
}

/// Picks the logo's top-left corner uniformly in `[1, allowed]` on both axes.
///
/// Both sizes are `(width, height)`.
pub fn place_logo<R: Rng + ?Sized>(
    logo_size: (u32, u32),
    canvas_size: (u32, u32),
    rng: &mut R,
) -> Result<PlacementRect> {
    let (logo_w, logo_h) = logo_size;
    let (canvas_w, canvas_h) = canvas_size;

    if logo_w == 0 || logo_h == 0 {
        return Err(AugmentError::EmptyImage {
            width: logo_w,
            height: logo_h,
        });
    }

    let allowed_x = allowed_range(logo_w, canvas_w);
    let allowed_y = allowed_range(logo_h, canvas_h);
    if allowed_x <= 0 || allowed_y <= 0 {
        return Err(AugmentError::LogoTooLarge {
            logo: logo_size,
            background: canvas_size,
            allowed: (allowed_x, allowed_y),
        });
    }

    let x1 = rng.random_range(1..=allowed_x as u32);
    let y1 = rng.random_range(1..=allowed_y as u32);
    let rect = PlacementRect {
        x1,
        y1,
        x2: x1 + logo_w,
        y2: y1 + logo_h,
    };

    assert!(
        rect.x1 > 0 && rect.y1 > 0 && rect.x1 < rect.x2 && rect.y1 < rect.y2,
        "degenerate placement {rect:?}"
    );
    assert!(
        rect.x2 < canvas_w && rect.y2 < canvas_h,
        "placement {rect:?} leaves canvas {canvas_w}x{canvas_h}"
    );

    Ok(rect)
}

/// Alpha-blends the logo's RGB channels into `canvas` at `rect`.
///
/// Channels past the third (a canvas alpha channel) are left untouched.
///
/// # Panics
/// If `rect` does not match the logo size or falls outside the canvas.
pub fn blend_logo<P: CanvasPixel>(
    canvas: &mut Canvas<P>,
    logo: &RgbaImage,
    rect: &PlacementRect,
    transparency: f64,
) {
    assert_eq!(
        (rect.width(), rect.height()),
        logo.dimensions(),
        "placement does not match logo size"
    );
    assert!(rect.x2 <= canvas.width() && rect.y2 <= canvas.height());

    let transparency = transparency as f32;

    for (x, y, logo_pixel) in logo.enumerate_pixels() {
        let mask = logo_pixel[3] as f32 / 255.0 * transparency;
        let target = canvas.get_pixel_mut(rect.x1 + x, rect.y1 + y);
        let channels = target.channels_mut();

        for c in 0..3 {
            let blended = (1.0 - mask) * channels[c] as f32 + mask * logo_pixel[c] as f32;
            channels[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Places the logo on `background` and blends it in.
///
/// The background is consumed and handed back inside the returned
/// [`Overlay`]; preconditions are checked before any pixel is written.
pub fn overlay_logo<P, R>(
    logo: &RgbaImage,
    mut background: Canvas<P>,
    transparency: &TransparencyConfig,
    rng: &mut R,
) -> Result<Overlay<P>>
where
    P: CanvasPixel,
    R: Rng + ?Sized,
{
    let rect = place_logo(logo.dimensions(), background.dimensions(), &mut *rng)?;
    let factor = transparency.sample(&mut *rng);

    log::debug!(
        "Overlay logo {}x{} at {:?} with transparency {}",
        logo.width(),
        logo.height(),
        rect.to_array(),
        factor
    );

    blend_logo(&mut background, logo, &rect, factor);

    Ok(Overlay {
        image: background,
        rect,
        transparency: factor,
    })
}
