//! The random color distortion algorithm.

use super::color;
use crate::common::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorJitterInit {
    pub brightness: Option<R64>,
    pub contrast: Option<R64>,
    pub saturation: Option<R64>,
}

impl ColorJitterInit {
    /// Use the same strength for brightness, contrast and saturation.
    pub fn uniform(strength: R64) -> Self {
        Self {
            brightness: Some(strength),
            contrast: Some(strength),
            saturation: Some(strength),
        }
    }

    pub fn build(self) -> Result<ColorJitter> {
        let Self {
            brightness,
            contrast,
            saturation,
        } = self;

        let to_range = |name: &str, strength: Option<R64>| -> Result<_> {
            strength
                .map(|strength| -> Result<_> {
                    ensure!(strength >= 0.0, "{} must be non-negative", name);
                    let strength = strength.raw() as f32;
                    Ok(((1.0 - strength).max(0.0), 1.0 + strength))
                })
                .transpose()
        };

        Ok(ColorJitter {
            brightness: to_range("brightness", brightness)?,
            contrast: to_range("contrast", contrast)?,
            saturation: to_range("saturation", saturation)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorJitter {
    brightness: Option<(f32, f32)>,
    contrast: Option<(f32, f32)>,
    saturation: Option<(f32, f32)>,
}

#[derive(Debug, Clone, Copy)]
enum Adjustment {
    Brightness,
    Contrast,
    Saturation,
}

impl ColorJitter {
    /// Apply the adjustments in random order with random factors.
    pub fn forward<R>(&self, image: RgbImage, rng: &mut R) -> RgbImage
    where
        R: Rng + ?Sized,
    {
        let mut order = [
            Adjustment::Brightness,
            Adjustment::Contrast,
            Adjustment::Saturation,
        ];
        order.shuffle(rng);

        order.iter().fold(image, |image, adjustment| {
            let range = match adjustment {
                Adjustment::Brightness => self.brightness,
                Adjustment::Contrast => self.contrast,
                Adjustment::Saturation => self.saturation,
            };
            let (lo, up) = match range {
                Some(range) => range,
                None => return image,
            };
            let factor = rng.gen_range(lo..=up);

            match adjustment {
                Adjustment::Brightness => color::adjust_brightness(&image, factor),
                Adjustment::Contrast => color::adjust_contrast(&image, factor),
                Adjustment::Saturation => color::adjust_saturation(&image, factor),
            }
        })
    }
}

impl Display for ColorJitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |range: Option<(f32, f32)>| match range {
            Some((lo, up)) => format!("({:.2}, {:.2})", lo, up),
            None => "None".to_owned(),
        };
        write!(
            f,
            "ColorJitter(brightness={}, contrast={}, saturation={})",
            show(self.brightness),
            show(self.contrast),
            show(self.saturation)
        )
    }
}
