//! Whole-image transforms applied to the composite after blending.

use crate::{
    AugmentError, Result,
    transform::{Canvas, CanvasPixel, ImageTransform},
};
use derivative::Derivative;
use derive_setters::Setters;
use rand::{Rng, RngCore};

/// Gaussian blur with a sigma drawn from `[min_sigma, max_sigma]`
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct GaussianBlurConfig {
    #[derivative(Default(value = "\"gaussian_blur\".to_string()"))]
    name: String,

    #[derivative(Default(value = "0.7"))]
    threshold: f64,

    #[derivative(Default(value = "0.5"))]
    min_sigma: f32,

    #[derivative(Default(value = "2.0"))]
    max_sigma: f32,
}

impl GaussianBlurConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: CanvasPixel> ImageTransform<P> for GaussianBlurConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn apply(&self, image: Canvas<P>, rng: &mut dyn RngCore) -> Result<Canvas<P>> {
        if !(self.min_sigma > 0.0 && self.min_sigma <= self.max_sigma) {
            return Err(AugmentError::Transform {
                name: self.name.clone(),
                message: format!(
                    "sigma range must satisfy 0 < min <= max, got [{}, {}]",
                    self.min_sigma, self.max_sigma
                ),
            });
        }

        let sigma = rng.random_range(self.min_sigma..=self.max_sigma);
        Ok(imageproc::filter::gaussian_blur_f32(&image, sigma))
    }
}

/// Adds uniform noise in `[-amplitude, amplitude]` to every colour channel
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct UniformNoiseConfig {
    #[derivative(Default(value = "\"noise\".to_string()"))]
    name: String,

    #[derivative(Default(value = "0.7"))]
    threshold: f64,

    #[derivative(Default(value = "12"))]
    amplitude: u8,
}

impl UniformNoiseConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: CanvasPixel> ImageTransform<P> for UniformNoiseConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn apply(&self, mut image: Canvas<P>, rng: &mut dyn RngCore) -> Result<Canvas<P>> {
        let amplitude = self.amplitude as i16;
        if amplitude == 0 {
            return Ok(image);
        }

        for pixel in image.pixels_mut() {
            for channel in pixel.channels_mut().iter_mut().take(3) {
                let noise = rng.random_range(-amplitude..=amplitude);
                *channel = (*channel as i16 + noise).clamp(0, 255) as u8;
            }
        }

        Ok(image)
    }
}

/// Shifts the brightness by a delta drawn from `[-max_delta, max_delta]`
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct BrightnessConfig {
    #[derivative(Default(value = "\"brightness\".to_string()"))]
    name: String,

    #[derivative(Default(value = "0.5"))]
    threshold: f64,

    #[derivative(Default(value = "40"))]
    max_delta: i32,
}

impl BrightnessConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: CanvasPixel> ImageTransform<P> for BrightnessConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn apply(&self, mut image: Canvas<P>, rng: &mut dyn RngCore) -> Result<Canvas<P>> {
        let max_delta = self.max_delta.abs();
        let delta = rng.random_range(-max_delta..=max_delta);

        for pixel in image.pixels_mut() {
            for channel in pixel.channels_mut().iter_mut().take(3) {
                *channel = (*channel as i32 + delta).clamp(0, 255) as u8;
            }
        }

        Ok(image)
    }
}

/// Luminance grayscale: 0.299*R + 0.587*G + 0.114*B
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct GrayscaleConfig {
    #[derivative(Default(value = "\"grayscale\".to_string()"))]
    name: String,

    #[derivative(Default(value = "0.9"))]
    threshold: f64,
}

impl GrayscaleConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: CanvasPixel> ImageTransform<P> for GrayscaleConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn apply(&self, mut image: Canvas<P>, _rng: &mut dyn RngCore) -> Result<Canvas<P>> {
        for pixel in image.pixels_mut() {
            let channels = pixel.channels_mut();
            let gray = (0.299 * channels[0] as f32
                + 0.587 * channels[1] as f32
                + 0.114 * channels[2] as f32) as u8;

            channels[0] = gray;
            channels[1] = gray;
            channels[2] = gray;
        }

        Ok(image)
    }
}

/// Whole-image transforms with their default settings.
pub fn default_image_transforms<P: CanvasPixel>() -> Vec<Box<dyn ImageTransform<P>>> {
    vec![
        Box::new(GaussianBlurConfig::new()),
        Box::new(UniformNoiseConfig::new()),
        Box::new(BrightnessConfig::new()),
        Box::new(GrayscaleConfig::new()),
    ]
}
