use crate::{Result, augmenter::Augmented, transform::CanvasPixel};
use serde::{Deserialize, Serialize};

/// Label record for one generated sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub width: u32,
    pub height: u32,

    /// `[x1, y1, x2, y2]` in pixels, `x2`/`y2` exclusive.
    pub bbox: [u32; 4],

    pub trace: Vec<String>,
    pub transparency: f64,
}

impl Annotation {
    pub fn new<P: CanvasPixel>(augmented: &Augmented<P>) -> Self {
        let (width, height) = augmented.image.dimensions();

        Self {
            width,
            height,
            bbox: augmented.bbox.to_array(),
            trace: augmented.trace.labels(),
            transparency: augmented.transparency,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// `class x_center y_center width height`, normalised to the image size.
    pub fn yolo_line(&self, class_id: usize) -> String {
        let [x1, y1, x2, y2] = self.bbox.map(|v| v as f64);
        let (width, height) = (self.width as f64, self.height as f64);

        format!(
            "{} {:.6} {:.6} {:.6} {:.6}",
            class_id,
            (x1 + x2) / 2.0 / width,
            (y1 + y2) / 2.0 / height,
            (x2 - x1) / width,
            (y2 - y1) / height
        )
    }
}
