//! Assemble train and evaluation pipelines from configuration.

use super::*;
use crate::{common::*, config::DatasetConfig};

/// At or below this input size, evaluation skips resizing and training
/// uses padded random crops.
pub const SMALL_INPUT_SIZE: u32 = 32;
/// At or above this input size, evaluation warps to a square.
pub const WARP_INPUT_SIZE: u32 = 384;
/// The crop ratio used when none is configured.
pub const DEFAULT_CROP_PCT: f64 = 224.0 / 256.0;
const SMALL_INPUT_PADDING: u32 = 4;

/// Options of a preprocessing pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformInit {
    pub is_train: bool,
    pub input_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub color_jitter: R64,
    pub auto_augment: Option<String>,
    pub interpolation: Interpolation,
    pub reprob: R64,
    /// The random erasing mode, parsed only when a train pipeline is built.
    pub remode: String,
    pub recount: usize,
    pub crop_pct: Option<R64>,
}

impl TransformInit {
    pub fn from_config(is_train: bool, config: &DatasetConfig) -> Result<Self> {
        let input_size = u32::try_from(config.input_size.get())
            .with_context(|| format!("input size {} is too large", config.input_size))?;
        let (mean, std) = if config.imagenet_default_mean_and_std {
            (IMAGENET_DEFAULT_MEAN, IMAGENET_DEFAULT_STD)
        } else {
            (IMAGENET_INCEPTION_MEAN, IMAGENET_INCEPTION_STD)
        };

        Ok(Self {
            is_train,
            input_size,
            mean,
            std,
            color_jitter: config.color_jitter,
            auto_augment: config.auto_augment.clone(),
            interpolation: config.train_interpolation,
            reprob: config.reprob,
            remode: config.remode.clone(),
            recount: config.recount,
            crop_pct: config.crop_pct,
        })
    }

    pub fn build(self) -> Result<TransformPipeline> {
        if self.is_train {
            self.build_train()
        } else {
            self.build_eval()
        }
    }

    fn build_train(self) -> Result<TransformPipeline> {
        let Self {
            input_size,
            mean,
            std,
            color_jitter,
            auto_augment,
            interpolation,
            reprob,
            remode,
            recount,
            ..
        } = self;

        let mut image_steps = vec![];

        if input_size <= SMALL_INPUT_SIZE {
            image_steps.push(ImageStep::RandomCrop(RandomCrop {
                size: input_size,
                padding: SMALL_INPUT_PADDING,
            }));
        } else {
            image_steps.push(ImageStep::RandomResizedCrop(RandomResizedCrop::new(
                input_size,
                interpolation,
            )));
        }
        image_steps.push(ImageStep::RandomHorizontalFlip(RandomHorizontalFlip {
            prob: 0.5,
        }));

        match auto_augment.as_deref().filter(|policy| !policy.is_empty()) {
            Some(policy) => {
                let fill = {
                    let [r, g, b] = mean.map(|value| (value * 255.0).round() as u8);
                    Rgb([r, g, b])
                };
                let augment = RandAugmentInit {
                    interpolation,
                    ..RandAugmentInit::parse(policy, fill)?
                }
                .build()?;
                image_steps.push(ImageStep::RandAugment(augment));
            }
            None if color_jitter > 0.0 => {
                let jitter = ColorJitterInit::uniform(color_jitter).build()?;
                image_steps.push(ImageStep::ColorJitter(jitter));
            }
            None => {}
        }

        let mut tensor_steps = vec![TensorStep::Normalize(Normalize::new(mean, std)?)];
        if reprob > 0.0 {
            let erasing = RandomErasingInit {
                prob: reprob,
                mode: remode.parse()?,
                max_count: recount,
            }
            .build()?;
            tensor_steps.push(TensorStep::RandomErasing(erasing));
        }

        Ok(TransformPipeline::new(image_steps, tensor_steps))
    }

    fn build_eval(self) -> Result<TransformPipeline> {
        let Self {
            input_size,
            mean,
            std,
            crop_pct,
            ..
        } = self;

        let mut image_steps = vec![];

        if input_size >= WARP_INPUT_SIZE {
            image_steps.push(ImageStep::Resize(Resize {
                size: ResizeSize::Exact {
                    height: input_size,
                    width: input_size,
                },
                interpolation: Interpolation::Bicubic,
            }));
            warn!(
                "warping {} size input images without cropping",
                input_size
            );
        } else if input_size > SMALL_INPUT_SIZE {
            let crop_pct = crop_pct.map(R64::raw).unwrap_or(DEFAULT_CROP_PCT);
            ensure!(
                crop_pct > 0.0 && crop_pct.is_finite(),
                "crop_pct must be positive, but get {}",
                crop_pct
            );
            let resize_size = (input_size as f64 / crop_pct).round() as u32;

            image_steps.push(ImageStep::Resize(Resize {
                size: ResizeSize::ShorterSide(resize_size),
                interpolation: Interpolation::Bicubic,
            }));
            image_steps.push(ImageStep::CenterCrop(CenterCrop { size: input_size }));
        }

        let tensor_steps = vec![TensorStep::Normalize(Normalize::new(mean, std)?)];
        Ok(TransformPipeline::new(image_steps, tensor_steps))
    }
}

/// Build the train or evaluation pipeline for a configuration.
pub fn build_transform(is_train: bool, config: &DatasetConfig) -> Result<TransformPipeline> {
    TransformInit::from_config(is_train, config)?.build()
}
