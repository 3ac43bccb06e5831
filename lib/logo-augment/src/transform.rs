use crate::Result;
use image::{ImageBuffer, Pixel, Rgb, Rgba, RgbaImage};
use rand::RngCore;
use std::marker::PhantomData;

/// Pixel types a logo can be composited onto. Only the first three channels
/// take part in blending.
pub trait CanvasPixel: Pixel<Subpixel = u8> + Send + Sync + 'static {}

impl CanvasPixel for Rgb<u8> {}
impl CanvasPixel for Rgba<u8> {}

pub type Canvas<P> = ImageBuffer<P, Vec<u8>>;

/// A transform applied to the logo before it is placed.
pub trait LogoTransform: Send + Sync {
    fn name(&self) -> &str;

    /// The transform runs when a uniform draw in [0, 1) is greater than this.
    fn threshold(&self) -> f64;

    /// `background_size` is `(height, width)` of the canvas the logo will be
    /// placed on.
    fn apply(
        &self,
        logo: RgbaImage,
        background_size: (u32, u32),
        rng: &mut dyn RngCore,
    ) -> Result<RgbaImage>;
}

/// A transform applied to the whole composite after the logo is blended in.
pub trait ImageTransform<P: CanvasPixel>: Send + Sync {
    fn name(&self) -> &str;

    fn threshold(&self) -> f64;

    fn apply(&self, image: Canvas<P>, rng: &mut dyn RngCore) -> Result<Canvas<P>>;
}

pub struct FnLogoTransform<F> {
    name: String,
    threshold: f64,
    func: F,
}

impl<F> FnLogoTransform<F>
where
    F: Fn(RgbaImage, (u32, u32), &mut dyn RngCore) -> Result<RgbaImage> + Send + Sync,
{
    pub fn new(name: impl Into<String>, threshold: f64, func: F) -> Self {
        Self {
            name: name.into(),
            threshold,
            func,
        }
    }
}

impl<F> LogoTransform for FnLogoTransform<F>
where
    F: Fn(RgbaImage, (u32, u32), &mut dyn RngCore) -> Result<RgbaImage> + Send + Sync,
{
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
        (self.func)(logo, background_size, rng)
    }
}

pub struct FnImageTransform<P, F> {
    name: String,
    threshold: f64,
    func: F,
    _pixel: PhantomData<fn() -> P>,
}

impl<P, F> FnImageTransform<P, F>
where
    P: CanvasPixel,
    F: Fn(Canvas<P>, &mut dyn RngCore) -> Result<Canvas<P>> + Send + Sync,
{
    pub fn new(name: impl Into<String>, threshold: f64, func: F) -> Self {
        Self {
            name: name.into(),
            threshold,
            func,
            _pixel: PhantomData,
        }
    }
}

impl<P, F> ImageTransform<P> for FnImageTransform<P, F>
where
    P: CanvasPixel,
    F: Fn(Canvas<P>, &mut dyn RngCore) -> Result<Canvas<P>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn apply(&self, image: Canvas<P>, rng: &mut dyn RngCore) -> Result<Canvas<P>> {
        (self.func)(image, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AugmentError;
    use image::RgbImage;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_fn_logo_transform_receives_context() {
        let transform = FnLogoTransform::new("resize", 0.3, |logo: RgbaImage, size, _rng| {
            assert_eq!(size, (40, 80));
            Ok(image::imageops::thumbnail(&logo, 2, 2))
        });

        assert_eq!(transform.name(), "resize");
        assert_eq!(transform.threshold(), 0.3);

        let mut rng = StdRng::seed_from_u64(1);
        let out = transform
            .apply(RgbaImage::new(8, 8), (40, 80), &mut rng)
            .unwrap();
        assert_eq!(out.dimensions(), (2, 2));
    }

    #[test]
    fn test_fn_image_transform_propagates_error() {
        let transform = FnImageTransform::<Rgb<u8>, _>::new("broken", 0.0, |_image, _rng| {
            Err(AugmentError::Transform {
                name: "broken".to_string(),
                message: "boom".to_string(),
            })
        });

        let mut rng = StdRng::seed_from_u64(1);
        let err = transform.apply(RgbImage::new(4, 4), &mut rng).unwrap_err();
        assert!(matches!(err, AugmentError::Transform { ref message, .. } if message == "boom"));
    }
}
