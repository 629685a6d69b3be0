use crate::common::*;
use rand_distr::StandardNormal;

/// How erased regions are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErasingMode {
    /// Zeros.
    Const,
    /// One normal sample per channel.
    Rand,
    /// One normal sample per value.
    Pixel,
}

impl FromStr for ErasingMode {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mode = match text {
            "const" => Self::Const,
            "rand" => Self::Rand,
            "pixel" => Self::Pixel,
            _ => bail!("unsupported random erasing mode '{}'", text),
        };
        Ok(mode)
    }
}

impl Display for ErasingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Const => "const",
            Self::Rand => "rand",
            Self::Pixel => "pixel",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomErasingInit {
    pub prob: R64,
    pub mode: ErasingMode,
    pub max_count: usize,
}

impl RandomErasingInit {
    pub fn build(self) -> Result<RandomErasing> {
        let Self {
            prob,
            mode,
            max_count,
        } = self;

        ensure!(
            (0.0..=1.0).contains(&prob.raw()),
            "random erasing probability must be within [0, 1]"
        );
        ensure!(max_count >= 1, "random erasing count must be at least 1");

        Ok(RandomErasing {
            prob: prob.raw(),
            mode,
            max_count,
            area: (0.02, 1.0 / 3.0),
            log_ratio: (0.3f64.ln(), (1.0 / 0.3f64).ln()),
        })
    }
}

/// Erase random rectangles of a normalized tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomErasing {
    prob: f64,
    mode: ErasingMode,
    max_count: usize,
    area: (f64, f64),
    log_ratio: (f64, f64),
}

impl RandomErasing {
    const MAX_ATTEMPTS: usize = 10;

    pub fn forward<R>(&self, mut tensor: Array3<f32>, rng: &mut R) -> Array3<f32>
    where
        R: Rng + ?Sized,
    {
        if !rng.gen_bool(self.prob) {
            return tensor;
        }

        let (channels, height, width) = tensor.dim();
        let area = (height * width) as f64;
        let count = if self.max_count == 1 {
            1
        } else {
            rng.gen_range(1..=self.max_count)
        };

        for _ in 0..count {
            let region = (0..Self::MAX_ATTEMPTS).find_map(|_| {
                let target_area =
                    rng.gen_range(self.area.0..=self.area.1) * area / count as f64;
                let aspect_ratio = rng.gen_range(self.log_ratio.0..=self.log_ratio.1).exp();
                let h = (target_area * aspect_ratio).sqrt().round() as usize;
                let w = (target_area / aspect_ratio).sqrt().round() as usize;

                (h > 0 && w > 0 && h < height && w < width).then(|| {
                    let top = rng.gen_range(0..=(height - h));
                    let left = rng.gen_range(0..=(width - w));
                    (top, left, h, w)
                })
            });

            let (top, left, h, w) = match region {
                Some(region) => region,
                None => continue,
            };

            let mut patch = tensor.slice_mut(ndarray::s![.., top..(top + h), left..(left + w)]);
            match self.mode {
                ErasingMode::Const => patch.fill(0.0),
                ErasingMode::Rand => {
                    for channel in 0..channels {
                        let value: f32 = rng.sample(StandardNormal);
                        patch.index_axis_mut(Axis(0), channel).fill(value);
                    }
                }
                ErasingMode::Pixel => {
                    patch.iter_mut().for_each(|value| *value = rng.sample(StandardNormal));
                }
            }
        }

        tensor
    }
}

impl Display for RandomErasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RandomErasing(p={}, mode={}, count=(1, {}))",
            self.prob, self.mode, self.max_count
        )
    }
}
