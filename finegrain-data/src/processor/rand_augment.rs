//! The RandAugment policy.
//!
//! A policy string looks like `rand-m9-mstd0.5-inc1`:
//!
//! * `m<int>` - the magnitude in `[0, 10]`.
//! * `n<int>` - the number of ops applied per image, 2 by default.
//! * `mstd<float>` - the standard deviation of magnitude noise.
//! * `mmax<float>` - the upper bound of the noisy magnitude, 10 by default.
//! * `inc<0|1>` - use ops whose strength increases with magnitude.

use super::{color, Interpolation};
use crate::common::*;
use rand_distr::Normal;

const MAX_LEVEL: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AugmentOp {
    AutoContrast,
    Equalize,
    Invert,
    Rotate,
    Posterize,
    PosterizeIncreasing,
    Solarize,
    SolarizeIncreasing,
    SolarizeAdd,
    Color,
    ColorIncreasing,
    Contrast,
    ContrastIncreasing,
    Brightness,
    BrightnessIncreasing,
    Sharpness,
    SharpnessIncreasing,
    ShearX,
    ShearY,
    TranslateXRel,
    TranslateYRel,
}

const RAND_TRANSFORMS: &[AugmentOp] = &[
    AugmentOp::AutoContrast,
    AugmentOp::Equalize,
    AugmentOp::Invert,
    AugmentOp::Rotate,
    AugmentOp::Posterize,
    AugmentOp::Solarize,
    AugmentOp::SolarizeAdd,
    AugmentOp::Color,
    AugmentOp::Contrast,
    AugmentOp::Brightness,
    AugmentOp::Sharpness,
    AugmentOp::ShearX,
    AugmentOp::ShearY,
    AugmentOp::TranslateXRel,
    AugmentOp::TranslateYRel,
];

const RAND_INCREASING_TRANSFORMS: &[AugmentOp] = &[
    AugmentOp::AutoContrast,
    AugmentOp::Equalize,
    AugmentOp::Invert,
    AugmentOp::Rotate,
    AugmentOp::PosterizeIncreasing,
    AugmentOp::SolarizeIncreasing,
    AugmentOp::SolarizeAdd,
    AugmentOp::ColorIncreasing,
    AugmentOp::ContrastIncreasing,
    AugmentOp::BrightnessIncreasing,
    AugmentOp::SharpnessIncreasing,
    AugmentOp::ShearX,
    AugmentOp::ShearY,
    AugmentOp::TranslateXRel,
    AugmentOp::TranslateYRel,
];

/// The parsed RandAugment options.
#[derive(Debug, Clone, PartialEq)]
pub struct RandAugmentInit {
    pub magnitude: f64,
    pub num_layers: usize,
    pub magnitude_std: f64,
    pub magnitude_max: f64,
    pub increasing: bool,
    /// The probability to apply each chosen op.
    pub prob: f64,
    /// The color of uncovered pixels after geometric ops.
    pub fill: Rgb<u8>,
    /// The resampling of geometric ops.
    pub interpolation: Interpolation,
}

impl RandAugmentInit {
    pub fn parse(policy: &str, fill: Rgb<u8>) -> Result<Self> {
        let mut sections = policy.split('-');
        ensure!(
            sections.next() == Some("rand"),
            "the auto augment policy '{}' is not supported, only 'rand' policies are",
            policy
        );

        let mut init = Self {
            magnitude: MAX_LEVEL,
            num_layers: 2,
            magnitude_std: 0.0,
            magnitude_max: MAX_LEVEL,
            increasing: false,
            prob: 0.5,
            fill,
            interpolation: Interpolation::Bicubic,
        };

        for section in sections {
            let parse_err = || format_err!("invalid section '{}' in policy '{}'", section, policy);

            if let Some(value) = section.strip_prefix("mstd") {
                init.magnitude_std = value.parse().map_err(|_| parse_err())?;
            } else if let Some(value) = section.strip_prefix("mmax") {
                init.magnitude_max = value.parse().map_err(|_| parse_err())?;
            } else if let Some(value) = section.strip_prefix("inc") {
                init.increasing = value.parse::<u8>().map_err(|_| parse_err())? != 0;
            } else if let Some(value) = section.strip_prefix('m') {
                init.magnitude = value.parse().map_err(|_| parse_err())?;
            } else if let Some(value) = section.strip_prefix('n') {
                init.num_layers = value.parse().map_err(|_| parse_err())?;
            } else {
                return Err(parse_err());
            }
        }

        Ok(init)
    }

    pub fn build(self) -> Result<RandAugment> {
        let Self {
            magnitude,
            num_layers,
            magnitude_std,
            magnitude_max,
            increasing,
            prob,
            fill,
            interpolation,
        } = self;

        ensure!(magnitude.is_finite(), "magnitude must be finite");
        ensure!(
            magnitude_max >= 0.0,
            "mmax must be non-negative, but get {}",
            magnitude_max
        );
        ensure!(magnitude_std >= 0.0, "mstd must be non-negative");
        ensure!((0.0..=1.0).contains(&prob), "prob must be within [0, 1]");

        let noise = if magnitude_std > 0.0 && magnitude_std.is_finite() {
            Some(Normal::new(0.0, magnitude_std)?)
        } else {
            None
        };

        let ops = if increasing {
            RAND_INCREASING_TRANSFORMS
        } else {
            RAND_TRANSFORMS
        };

        Ok(RandAugment {
            ops,
            magnitude,
            magnitude_max,
            noise,
            uniform_magnitude: magnitude_std.is_infinite(),
            num_layers,
            prob,
            fill,
            interpolation,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RandAugment {
    ops: &'static [AugmentOp],
    magnitude: f64,
    magnitude_max: f64,
    noise: Option<Normal<f64>>,
    uniform_magnitude: bool,
    num_layers: usize,
    prob: f64,
    fill: Rgb<u8>,
    interpolation: Interpolation,
}

impl RandAugment {
    pub fn forward<R>(&self, image: RgbImage, rng: &mut R) -> RgbImage
    where
        R: Rng + ?Sized,
    {
        (0..self.num_layers).fold(image, |image, _| {
            let op = match self.ops.choose(rng) {
                Some(&op) => op,
                None => return image,
            };
            if !rng.gen_bool(self.prob) {
                return image;
            }
            let magnitude = self.sample_magnitude(rng);
            self.apply(op, &image, magnitude, rng)
        })
    }

    fn sample_magnitude<R>(&self, rng: &mut R) -> f64
    where
        R: Rng + ?Sized,
    {
        let magnitude = if self.uniform_magnitude {
            rng.gen_range(0.0..=self.magnitude.max(0.0))
        } else if let Some(noise) = &self.noise {
            self.magnitude + rng.sample(noise)
        } else {
            self.magnitude
        };
        magnitude.clamp(0.0, self.magnitude_max)
    }

    fn apply<R>(&self, op: AugmentOp, image: &RgbImage, magnitude: f64, rng: &mut R) -> RgbImage
    where
        R: Rng + ?Sized,
    {
        use AugmentOp as O;

        let level = magnitude / MAX_LEVEL;
        let (width, height) = image.dimensions();
        let interpolation = self.interpolation.warp(rng);
        let mut random_sign = |value: f64| {
            if rng.gen_bool(0.5) {
                -value
            } else {
                value
            }
        };

        match op {
            O::AutoContrast => color::autocontrast(image),
            O::Equalize => color::equalize(image),
            O::Invert => color::invert(image),
            O::Rotate => {
                let degrees = random_sign(level * 30.0);
                color::rotate(image, degrees, interpolation, self.fill)
            }
            O::Posterize => color::posterize(image, (level * 4.0) as u8),
            O::PosterizeIncreasing => {
                color::posterize(image, 4u8.saturating_sub((level * 4.0) as u8))
            }
            O::Solarize => color::solarize(image, (level * 256.0) as u16),
            O::SolarizeIncreasing => {
                color::solarize(image, 256u16.saturating_sub((level * 256.0) as u16))
            }
            O::SolarizeAdd => color::solarize_add(image, (level * 110.0) as u8),
            O::Color => color::adjust_saturation(image, enhance_factor(level)),
            O::ColorIncreasing => {
                color::adjust_saturation(image, 1.0 + random_sign(level * 0.9) as f32)
            }
            O::Contrast => color::adjust_contrast(image, enhance_factor(level)),
            O::ContrastIncreasing => {
                color::adjust_contrast(image, 1.0 + random_sign(level * 0.9) as f32)
            }
            O::Brightness => color::adjust_brightness(image, enhance_factor(level)),
            O::BrightnessIncreasing => {
                color::adjust_brightness(image, 1.0 + random_sign(level * 0.9) as f32)
            }
            O::Sharpness => color::adjust_sharpness(image, enhance_factor(level)),
            O::SharpnessIncreasing => {
                color::adjust_sharpness(image, 1.0 + random_sign(level * 0.9) as f32)
            }
            O::ShearX => {
                let shear = random_sign(level * 0.3);
                let matrix = [1.0, shear, 0.0, 0.0, 1.0, 0.0];
                color::affine(image, matrix, interpolation, self.fill)
            }
            O::ShearY => {
                let shear = random_sign(level * 0.3);
                let matrix = [1.0, 0.0, 0.0, shear, 1.0, 0.0];
                color::affine(image, matrix, interpolation, self.fill)
            }
            O::TranslateXRel => {
                let pixels = random_sign(level * 0.45) * width as f64;
                let matrix = [1.0, 0.0, pixels, 0.0, 1.0, 0.0];
                color::affine(image, matrix, interpolation, self.fill)
            }
            O::TranslateYRel => {
                let pixels = random_sign(level * 0.45) * height as f64;
                let matrix = [1.0, 0.0, 0.0, 0.0, 1.0, pixels];
                color::affine(image, matrix, interpolation, self.fill)
            }
        }
    }
}

fn enhance_factor(level: f64) -> f32 {
    (level * 1.8 + 0.1) as f32
}

impl Display for RandAugment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RandAugment(n={}, m={}, interpolation={}, ops=[{}])",
            self.num_layers,
            self.magnitude,
            self.interpolation,
            self.ops.iter().map(|op| format!("{:?}", op)).join(", ")
        )
    }
}
