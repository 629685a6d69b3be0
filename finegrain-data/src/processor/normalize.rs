use crate::common::*;

pub const IMAGENET_DEFAULT_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_DEFAULT_STD: [f32; 3] = [0.229, 0.224, 0.225];
pub const IMAGENET_INCEPTION_MEAN: [f32; 3] = [0.5, 0.5, 0.5];
pub const IMAGENET_INCEPTION_STD: [f32; 3] = [0.5, 0.5, 0.5];

/// Convert an image to a channel-first tensor with values in `[0, 1]`.
pub fn to_tensor(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    Array3::from_shape_fn(
        (3, height as usize, width as usize),
        |(channel, y, x)| image.get_pixel(x as u32, y as u32).0[channel] as f32 / 255.0,
    )
}

/// Per-channel `(value - mean) / std`.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalize {
    mean: [f32; 3],
    std: [f32; 3],
}

impl Normalize {
    pub fn new(mean: [f32; 3], std: [f32; 3]) -> Result<Self> {
        ensure!(
            std.iter().all(|&std| std > 0.0),
            "normalization std must be positive, but get {:?}",
            std
        );
        Ok(Self { mean, std })
    }

    pub fn mean(&self) -> [f32; 3] {
        self.mean
    }

    pub fn std(&self) -> [f32; 3] {
        self.std
    }

    pub fn forward(&self, mut tensor: Array3<f32>) -> Array3<f32> {
        tensor
            .axis_iter_mut(Axis(0))
            .zip(self.mean.iter().zip(self.std.iter()))
            .for_each(|(mut channel, (&mean, &std))| {
                channel.mapv_inplace(|value| (value - mean) / std);
            });
        tensor
    }
}

impl Display for Normalize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Normalize(mean={:?}, std={:?})", self.mean, self.std)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn channel_first_tensor() {
        let image = RgbImage::from_fn(3, 2, |x, y| Rgb([255, (x * 10) as u8, (y * 51) as u8]));
        let tensor = to_tensor(&image);
        assert_eq!(tensor.dim(), (3, 2, 3));
        assert_abs_diff_eq!(tensor[[0, 1, 2]], 1.0);
        assert_abs_diff_eq!(tensor[[1, 0, 2]], 20.0 / 255.0);
        assert_abs_diff_eq!(tensor[[2, 1, 0]], 0.2);
    }

    #[test]
    fn normalize_per_channel() -> Result<()> {
        let normalize = Normalize::new(IMAGENET_INCEPTION_MEAN, IMAGENET_INCEPTION_STD)?;
        let tensor = normalize.forward(Array3::from_elem((3, 2, 2), 1.0));
        assert!(tensor.iter().all(|&value| (value - 1.0).abs() < 1e-6));

        assert!(Normalize::new([0.0; 3], [0.2, 0.0, 0.2]).is_err());
        Ok(())
    }
}
