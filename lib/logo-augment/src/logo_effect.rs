//! Logo-space transforms, applied before the logo is placed.

use crate::{AugmentError, Result, transform::LogoTransform};
use derivative::Derivative;
use derive_setters::Setters;
use image::{
    Rgba, RgbaImage,
    imageops::{self, FilterType},
};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use rand::{Rng, RngCore};

/// Largest logo side that still leaves at least one placement position on a
/// canvas side of `canvas_len`.
fn max_placeable(canvas_len: u32) -> u32 {
    (canvas_len.saturating_sub(1) as u64 * 100 / 105) as u32
}

/// Shrinks `logo`, keeping its aspect ratio, until it leaves a placement
/// position on a background of `(height, width)`. Fitting logos pass through.
fn fit_placeable(logo: RgbaImage, background_size: (u32, u32)) -> RgbaImage {
    let (bg_height, bg_width) = background_size;
    let (width, height) = logo.dimensions();
    let (cap_w, cap_h) = (max_placeable(bg_width).max(1), max_placeable(bg_height).max(1));

    if width <= cap_w && height <= cap_h {
        return logo;
    }

    let scale = (cap_w as f32 / width as f32).min(cap_h as f32 / height as f32);
    let new_width = ((width as f32 * scale).round() as u32).clamp(1, cap_w);
    let new_height = ((height as f32 * scale).round() as u32).clamp(1, cap_h);

    imageops::resize(&logo, new_width, new_height, FilterType::Triangle)
}

/// Tight bounds `(x, y, width, height)` of the non-transparent pixels.
pub fn alpha_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }

        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    bounds.map(|(x0, y0, x1, y1)| (x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

/// Resizes the logo so its longer side is a random fraction of the
/// background's shorter side. The result always fits the placement margin.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct RandomScaleConfig {
    #[derivative(Default(value = "\"random_scale\".to_string()"))]
    name: String,

    #[derivative(Default(value = "0.3"))]
    threshold: f64,

    #[derivative(Default(value = "0.1"))]
    min_ratio: f32,

    #[derivative(Default(value = "0.5"))]
    max_ratio: f32,
}

impl RandomScaleConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogoTransform for RandomScaleConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn apply(
        &self,
        logo: RgbaImage,
        background_size: (u32, u32),
        rng: &mut dyn RngCore,
    ) -> Result<RgbaImage> {
        let (width, height) = logo.dimensions();
        if width == 0 || height == 0 {
            return Err(AugmentError::EmptyImage { width, height });
        }

        if !(self.min_ratio > 0.0 && self.min_ratio <= self.max_ratio) {
            return Err(AugmentError::Transform {
                name: self.name.clone(),
                message: format!(
                    "ratio range must satisfy 0 < min <= max, got [{}, {}]",
                    self.min_ratio, self.max_ratio
                ),
            });
        }

        let (bg_height, bg_width) = background_size;
        let ratio = rng.random_range(self.min_ratio..=self.max_ratio);
        let target = ratio * bg_height.min(bg_width) as f32;

        let (cap_w, cap_h) = (max_placeable(bg_width).max(1), max_placeable(bg_height).max(1));
        let scale = (target / width.max(height) as f32)
            .min(cap_w as f32 / width as f32)
            .min(cap_h as f32 / height as f32);

        let new_width = ((width as f32 * scale).round() as u32).clamp(1, cap_w);
        let new_height = ((height as f32 * scale).round() as u32).clamp(1, cap_h);

        Ok(imageops::resize(&logo, new_width, new_height, FilterType::Triangle))
    }
}

/// Rotates the logo by a random angle in `[-max_degrees, max_degrees]`.
///
/// The logo is padded first so no corner is cut, then cropped back to its
/// visible pixels. A result that outgrew the background is shrunk back to a
/// placeable size.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct RandomRotationConfig {
    #[derivative(Default(value = "\"rotate\".to_string()"))]
    name: String,

    #[derivative(Default(value = "0.5"))]
    threshold: f64,

    #[derivative(Default(value = "30.0"))]
    max_degrees: f32,
}

impl RandomRotationConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogoTransform for RandomRotationConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn apply(
        &self,
        logo: RgbaImage,
        background_size: (u32, u32),
        rng: &mut dyn RngCore,
    ) -> Result<RgbaImage> {
        let max_degrees = self.max_degrees.abs();
        let degrees = rng.random_range(-max_degrees..=max_degrees);

        let (width, height) = logo.dimensions();
        let side = ((width as f32).hypot(height as f32)).ceil() as u32;
        let mut padded = RgbaImage::new(side, side);
        imageops::replace(
            &mut padded,
            &logo,
            ((side - width) / 2) as i64,
            ((side - height) / 2) as i64,
        );

        let rotated = rotate_about_center(
            &padded,
            degrees.to_radians(),
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 0]),
        );

        let cropped = match alpha_bounds(&rotated) {
            Some((x, y, w, h)) => imageops::crop_imm(&rotated, x, y, w, h).to_image(),
            None => rotated,
        };

        Ok(fit_placeable(cropped, background_size))
    }
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct HorizontalFlipConfig {
    #[derivative(Default(value = "\"flip\".to_string()"))]
    name: String,

    #[derivative(Default(value = "0.5"))]
    threshold: f64,
}

impl HorizontalFlipConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogoTransform for HorizontalFlipConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn apply(
        &self,
        logo: RgbaImage,
        _background_size: (u32, u32),
        _rng: &mut dyn RngCore,
    ) -> Result<RgbaImage> {
        Ok(imageops::flip_horizontal(&logo))
    }
}

/// Shifts each colour channel of the logo independently, alpha untouched
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct ColorJitterConfig {
    #[derivative(Default(value = "\"color_jitter\".to_string()"))]
    name: String,

    #[derivative(Default(value = "0.5"))]
    threshold: f64,

    #[derivative(Default(value = "30"))]
    max_delta: i32,
}

impl ColorJitterConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogoTransform for ColorJitterConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn apply(
        &self,
        mut logo: RgbaImage,
        _background_size: (u32, u32),
        rng: &mut dyn RngCore,
    ) -> Result<RgbaImage> {
        let max_delta = self.max_delta.abs();
        let deltas: [i32; 3] = std::array::from_fn(|_| rng.random_range(-max_delta..=max_delta));

        for pixel in logo.pixels_mut() {
            for (i, delta) in deltas.iter().enumerate() {
                pixel[i] = (pixel[i] as i32 + delta).clamp(0, 255) as u8;
            }
        }

        Ok(logo)
    }
}

/// Logo transforms with their default settings.
pub fn default_logo_transforms() -> Vec<Box<dyn LogoTransform>> {
    vec![
        Box::new(RandomScaleConfig::new()),
        Box::new(RandomRotationConfig::new()),
        Box::new(HorizontalFlipConfig::new()),
        Box::new(ColorJitterConfig::new()),
    ]
}
