use crate::{
    AugmentError, Result,
    overlay::{self, PlacementRect, TransparencyConfig},
    transform::{Canvas, CanvasPixel, ImageTransform, LogoTransform},
};
use derive_setters::Setters;
use image::{Rgb, RgbaImage};
use rand::Rng;
use std::fmt;

/// One step recorded while generating an image.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEntry {
    Logo(String),
    Transparency(f64),
    Image(String),
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEntry::Logo(name) | TraceEntry::Image(name) => write!(f, "{name}"),
            // `{:?}` keeps the decimal point for whole numbers: "1.0"
            TraceEntry::Transparency(value) => write!(f, "transp_value: {value:?}"),
        }
    }
}

/// Ordered log of what was applied: logo transforms, the transparency
/// marker, then image transforms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn transparency(&self) -> Option<f64> {
        self.entries.iter().find_map(|entry| match entry {
            TraceEntry::Transparency(value) => Some(*value),
            _ => None,
        })
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.to_string()).collect()
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.labels().join(", "))
    }
}

/// A generated sample.
#[derive(Debug, Clone)]
pub struct Augmented<P: CanvasPixel> {
    pub image: Canvas<P>,
    pub bbox: PlacementRect,
    pub trace: Trace,
    pub transparency: f64,
}

impl<P: CanvasPixel> Augmented<P> {
    pub fn into_parts(self) -> (Canvas<P>, [u32; 4], Vec<String>) {
        let labels = self.trace.labels();
        (self.image, self.bbox.to_array(), labels)
    }
}

#[derive(Setters)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct AugmenterConfig<P: CanvasPixel = Rgb<u8>> {
    #[setters(skip)]
    pub logo_transforms: Vec<Box<dyn LogoTransform>>,

    #[setters(skip)]
    pub image_transforms: Vec<Box<dyn ImageTransform<P>>>,

    pub transparency: TransparencyConfig,
}

impl<P: CanvasPixel> Default for AugmenterConfig<P> {
    fn default() -> Self {
        Self {
            logo_transforms: vec![],
            image_transforms: vec![],
            transparency: TransparencyConfig::default(),
        }
    }
}

impl<P: CanvasPixel> AugmenterConfig<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logo_transform(mut self, transform: impl LogoTransform + 'static) -> Self {
        self.logo_transforms.push(Box::new(transform));
        self
    }

    pub fn with_image_transform(mut self, transform: impl ImageTransform<P> + 'static) -> Self {
        self.image_transforms.push(Box::new(transform));
        self
    }

    pub fn with_boxed_logo_transforms(
        mut self,
        transforms: impl IntoIterator<Item = Box<dyn LogoTransform>>,
    ) -> Self {
        self.logo_transforms.extend(transforms);
        self
    }

    pub fn with_boxed_image_transforms(
        mut self,
        transforms: impl IntoIterator<Item = Box<dyn ImageTransform<P>>>,
    ) -> Self {
        self.image_transforms.extend(transforms);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.transparency.validate()?;

        let thresholds = self
            .logo_transforms
            .iter()
            .map(|t| (t.name(), t.threshold()))
            .chain(
                self.image_transforms
                    .iter()
                    .map(|t| (t.name(), t.threshold())),
            );

        for (name, threshold) in thresholds {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(AugmentError::InvalidConfig(format!(
                    "threshold of transform `{name}` must be in [0, 1], got {threshold}"
                )));
            }
        }

        Ok(())
    }
}

impl<P: CanvasPixel> fmt::Debug for AugmenterConfig<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let logo: Vec<&str> = self.logo_transforms.iter().map(|t| t.name()).collect();
        let image: Vec<&str> = self.image_transforms.iter().map(|t| t.name()).collect();

        f.debug_struct("AugmenterConfig")
            .field("logo_transforms", &logo)
            .field("image_transforms", &image)
            .field("transparency", &self.transparency)
            .finish()
    }
}

/// Composites a logo onto a background with randomized transforms.
#[derive(Debug)]
pub struct Augmenter<P: CanvasPixel = Rgb<u8>> {
    config: AugmenterConfig<P>,
}

impl<P: CanvasPixel> Augmenter<P> {
    pub fn new(config: AugmenterConfig<P>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AugmenterConfig<P> {
        &self.config
    }

    /// Runs the logo transforms, blends the logo into `background` and runs
    /// the whole-image transforms.
    ///
    /// `background` is taken by value and returned as the composite. Every
    /// random decision is drawn from `rng`, so a seeded generator gives
    /// reproducible output. A logo that leaves no room for placement fails
    /// with [`AugmentError::LogoTooLarge`].
    pub fn generate_image<R: Rng>(
        &self,
        mut logo: RgbaImage,
        background: Canvas<P>,
        rng: &mut R,
    ) -> Result<Augmented<P>> {
        let mut trace = Trace::new();
        let background_size = (background.height(), background.width());

        for transform in &self.config.logo_transforms {
            if rng.random::<f64>() > transform.threshold() {
                logo = transform.apply(logo, background_size, &mut *rng)?;
                log::debug!(
                    "Applied logo transform `{}` -> {}x{}",
                    transform.name(),
                    logo.width(),
                    logo.height()
                );
                trace.push(TraceEntry::Logo(transform.name().to_string()));
            } else {
                log::trace!("Skipped logo transform `{}`", transform.name());
            }
        }

        let overlay =
            overlay::overlay_logo(&logo, background, &self.config.transparency, &mut *rng)?;
        trace.push(TraceEntry::Transparency(overlay.transparency));

        let mut image = overlay.image;
        for transform in &self.config.image_transforms {
            if rng.random::<f64>() > transform.threshold() {
                image = transform.apply(image, &mut *rng)?;
                log::debug!("Applied image transform `{}`", transform.name());
                trace.push(TraceEntry::Image(transform.name().to_string()));
            } else {
                log::trace!("Skipped image transform `{}`", transform.name());
            }
        }

        log::debug!("Generated image with trace {trace}");

        Ok(Augmented {
            image,
            bbox: overlay.rect,
            trace,
            transparency: overlay.transparency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{FnImageTransform, FnLogoTransform};
    use image::{RgbImage, Rgba};
    use rand::{SeedableRng, rngs::StdRng};

    fn opaque_logo(size: u32) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([255, 0, 0, 255]))
    }

    fn identity_logo(name: &'static str, threshold: f64) -> impl LogoTransform + 'static {
        FnLogoTransform::new(name, threshold, |logo: RgbaImage, _size, _rng| Ok(logo))
    }

    fn identity_image(name: &'static str, threshold: f64) -> impl ImageTransform<Rgb<u8>> + 'static {
        FnImageTransform::new(name, threshold, |image: RgbImage, _rng| Ok(image))
    }

    #[test]
    fn test_trace_entry_display() {
        assert_eq!(TraceEntry::Transparency(1.0).to_string(), "transp_value: 1.0");
        assert_eq!(TraceEntry::Transparency(0.35).to_string(), "transp_value: 0.35");
        assert_eq!(TraceEntry::Logo("rotate".into()).to_string(), "rotate");
    }

    #[test]
    fn test_trace_order() {
        let config = AugmenterConfig::<Rgb<u8>>::new()
            .with_logo_transform(identity_logo("logo_a", 0.0))
            .with_logo_transform(identity_logo("logo_skip", 1.0))
            .with_logo_transform(identity_logo("logo_b", 0.0))
            .with_image_transform(identity_image("image_a", 0.0))
            .with_image_transform(identity_image("image_skip", 1.0))
            .with_transparency(TransparencyConfig::opaque());
        let augmenter = Augmenter::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let out = augmenter
            .generate_image(opaque_logo(10), RgbImage::new(64, 64), &mut rng)
            .unwrap();

        assert_eq!(
            out.trace.labels(),
            vec!["logo_a", "logo_b", "transp_value: 1.0", "image_a"]
        );
        assert_eq!(out.trace.transparency(), Some(1.0));
        assert_eq!(out.trace.len(), 4);
        assert_eq!(out.trace.entries()[2], TraceEntry::Transparency(1.0));
        assert_eq!(out.trace.entries()[3], TraceEntry::Image("image_a".to_string()));
    }

    #[test]
    fn test_empty_trace() {
        let mut trace = Trace::new();
        assert!(trace.is_empty());
        assert_eq!(trace.transparency(), None);
        assert_eq!(trace.to_string(), "[]");

        trace.push(TraceEntry::Logo("flip".to_string()));
        assert!(!trace.is_empty());
        assert_eq!(trace.to_string(), "[flip]");
    }

    #[test]
    fn test_logo_transform_context_and_bbox() {
        let shrink = FnLogoTransform::new("shrink", 0.0, |logo: RgbaImage, size, _rng| {
            assert_eq!(size, (60, 90));
            Ok(image::imageops::thumbnail(&logo, 12, 8))
        });
        let config = AugmenterConfig::<Rgb<u8>>::new()
            .with_logo_transform(shrink)
            .with_transparency(TransparencyConfig::opaque());
        let augmenter = Augmenter::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        let out = augmenter
            .generate_image(opaque_logo(40), RgbImage::new(90, 60), &mut rng)
            .unwrap();

        assert_eq!((out.bbox.width(), out.bbox.height()), (12, 8));
        assert!(out.bbox.x2 < 90 && out.bbox.y2 < 60);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let config =
            AugmenterConfig::<Rgb<u8>>::new().with_image_transform(identity_image("bad", 1.5));
        let err = Augmenter::new(config).unwrap_err();

        assert!(matches!(err, AugmentError::InvalidConfig(_)));
    }

    #[test]
    fn test_invalid_transparency_rejected() {
        let config = AugmenterConfig::<Rgb<u8>>::new()
            .with_transparency(TransparencyConfig::new().with_range(0.9, 0.1));

        assert!(Augmenter::new(config).is_err());
    }

    #[test]
    fn test_transform_error_propagates() {
        let failing = FnLogoTransform::new("failing", 0.0, |_logo: RgbaImage, _size, _rng| {
            Err(AugmentError::Transform {
                name: "failing".to_string(),
                message: "unsupported logo".to_string(),
            })
        });
        let augmenter =
            Augmenter::<Rgb<u8>>::new(AugmenterConfig::new().with_logo_transform(failing)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let err = augmenter
            .generate_image(opaque_logo(10), RgbImage::new(64, 64), &mut rng)
            .unwrap_err();
        assert!(matches!(err, AugmentError::Transform { .. }));
    }

    #[test]
    fn test_logo_too_large_after_transform() {
        let grow = FnLogoTransform::new("grow", 0.0, |logo: RgbaImage, _size, _rng| {
            Ok(image::imageops::resize(
                &logo,
                80,
                80,
                image::imageops::FilterType::Nearest,
            ))
        });
        let augmenter =
            Augmenter::<Rgb<u8>>::new(AugmenterConfig::new().with_logo_transform(grow)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let err = augmenter
            .generate_image(opaque_logo(10), RgbImage::new(64, 64), &mut rng)
            .unwrap_err();
        assert!(matches!(err, AugmentError::LogoTooLarge { .. }));
    }

    #[test]
    fn test_into_parts() {
        let augmenter = Augmenter::<Rgb<u8>>::new(
            AugmenterConfig::new().with_transparency(TransparencyConfig::opaque()),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(2);

        let out = augmenter
            .generate_image(opaque_logo(10), RgbImage::new(32, 32), &mut rng)
            .unwrap();
        let bbox = out.bbox;
        let (image, coords, labels) = out.into_parts();

        assert_eq!(image.dimensions(), (32, 32));
        assert_eq!(coords, bbox.to_array());
        assert_eq!(labels, vec!["transp_value: 1.0".to_string()]);
    }
}
