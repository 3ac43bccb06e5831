/// Logo augmentation example
/// Composites a synthetic logo onto a synthetic background a few times and
/// writes the images plus their YOLO labels and JSON annotations.
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use logo_augment::{
    Annotation, Augmenter, AugmenterConfig, TransparencyConfig,
    image_effect::default_image_transforms, logo_effect::default_logo_transforms,
};
use rand::{SeedableRng, rngs::StdRng};
use std::path::Path;

fn background(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width) as u8,
            (y * 255 / height) as u8,
            ((x + y) % 64 + 96) as u8,
        ])
    })
}

fn logo(size: u32) -> RgbaImage {
    let center = size as f32 / 2.0;

    RgbaImage::from_fn(size, size, |x, y| {
        let distance = ((x as f32 - center).powi(2) + (y as f32 - center).powi(2)).sqrt();
        if distance < center * 0.9 {
            Rgba([230, 40, 40, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let output_dir = Path::new("tmp");
    std::fs::create_dir_all(output_dir)?;

    let config = AugmenterConfig::<Rgb<u8>>::new()
        .with_boxed_logo_transforms(default_logo_transforms())
        .with_boxed_image_transforms(default_image_transforms())
        .with_transparency(TransparencyConfig::new().with_range(0.6, 1.0));
    let augmenter = Augmenter::new(config)?;
    let mut rng = StdRng::seed_from_u64(2024);

    for i in 0..4 {
        let out = augmenter.generate_image(logo(64), background(320, 240), &mut rng)?;
        let annotation = Annotation::new(&out);

        out.image.save(output_dir.join(format!("augmented_{i}.png")))?;
        std::fs::write(
            output_dir.join(format!("augmented_{i}.txt")),
            annotation.yolo_line(0),
        )?;
        std::fs::write(
            output_dir.join(format!("augmented_{i}.json")),
            annotation.to_json()?,
        )?;

        println!("✓ augmented_{i}.png bbox={:?} trace={}", annotation.bbox, out.trace);
    }

    println!("\n✓ Images saved to: tmp/");

    Ok(())
}
