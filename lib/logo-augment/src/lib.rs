pub mod annotation;
pub mod augmenter;
pub mod image_effect;
pub mod logo_effect;
pub mod overlay;
pub mod transform;

pub use annotation::Annotation;
pub use augmenter::{Augmented, Augmenter, AugmenterConfig, Trace, TraceEntry};
pub use overlay::{Overlay, PlacementRect, TransparencyConfig};
pub use transform::{CanvasPixel, FnImageTransform, FnLogoTransform, ImageTransform, LogoTransform};

pub type Result<T> = std::result::Result<T, AugmentError>;

#[derive(thiserror::Error, Debug)]
pub enum AugmentError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Empty image: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("Logo {logo:?} is too large for background {background:?} (allowed range {allowed:?})")]
    LogoTooLarge {
        logo: (u32, u32),
        background: (u32, u32),
        allowed: (i64, i64),
    },

    #[error("Transform `{name}` failed: {message}")]
    Transform { name: String, message: String },

    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
}
