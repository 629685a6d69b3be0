mod common;

use anyhow::Result;
use common::config;
use finegrain_data::processor::{build_transform, ImageStep, ResizeSize, TransformPipeline};
use image::{Rgb, RgbImage};
use rand::{rngs::StdRng, SeedableRng};
use std::path::Path;

fn pipeline(is_train: bool, input_size: usize) -> Result<TransformPipeline> {
    build_transform(is_train, &config("IMNET", Path::new("/data"), 1000, input_size))
}

#[test]
fn output_is_square_for_any_source_size() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(2022);
    let source_sizes = [(500, 375), (375, 500), (224, 224), (97, 1200), (40, 40)];

    for input_size in [64, 224, 384] {
        for is_train in [true, false] {
            let pipeline = pipeline(is_train, input_size)?;
            for &(width, height) in &source_sizes {
                let image = RgbImage::from_fn(width, height, |x, y| {
                    Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8])
                });
                let tensor = pipeline.forward_with_rng(image, &mut rng)?;
                assert_eq!(tensor.dim(), (3, input_size, input_size));
                assert!(tensor.iter().all(|value| value.is_finite()));
            }
        }
    }
    Ok(())
}

#[test]
fn eval_resize_threshold() -> Result<()> {
    let warp = pipeline(false, 384)?;
    assert!(matches!(
        warp.image_steps(),
        [ImageStep::Resize(resize)]
            if resize.size == ResizeSize::Exact { height: 384, width: 384 }
    ));

    let crop = pipeline(false, 224)?;
    assert!(matches!(
        crop.image_steps(),
        [ImageStep::Resize(resize), ImageStep::CenterCrop(center_crop)]
            if resize.size == ResizeSize::ShorterSide(256) && center_crop.size == 224
    ));
    Ok(())
}

#[test]
fn small_eval_input_keeps_source_size() -> Result<()> {
    let pipeline = pipeline(false, 32)?;
    let tensor = pipeline.forward(RgbImage::new(32, 32))?;
    assert_eq!(tensor.dim(), (3, 32, 32));
    Ok(())
}
