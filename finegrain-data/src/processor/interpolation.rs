use crate::common::*;
use imageproc::geometric_transformations::Interpolation as WarpInterpolation;

/// The resampling filter of resizing steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Nearest,
    Bilinear,
    Bicubic,
    /// Bilinear or bicubic, drawn per call.
    Random,
}

impl Interpolation {
    /// Resolve to a concrete filter, drawing one if this is [Interpolation::Random].
    pub fn filter<R>(&self, rng: &mut R) -> FilterType
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Bilinear => FilterType::Triangle,
            Self::Bicubic => FilterType::CatmullRom,
            Self::Random => {
                if rng.gen::<bool>() {
                    FilterType::Triangle
                } else {
                    FilterType::CatmullRom
                }
            }
        }
    }

    /// Resolve to the resampling mode of geometric warps.
    pub fn warp<R>(&self, rng: &mut R) -> WarpInterpolation
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::Nearest => WarpInterpolation::Nearest,
            Self::Bilinear => WarpInterpolation::Bilinear,
            Self::Bicubic => WarpInterpolation::Bicubic,
            Self::Random => {
                if rng.gen::<bool>() {
                    WarpInterpolation::Bilinear
                } else {
                    WarpInterpolation::Bicubic
                }
            }
        }
    }
}

impl FromStr for Interpolation {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let interpolation = match text {
            "nearest" => Self::Nearest,
            "bilinear" => Self::Bilinear,
            "bicubic" => Self::Bicubic,
            "random" => Self::Random,
            _ => bail!("unsupported interpolation '{}'", text),
        };
        Ok(interpolation)
    }
}

impl Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
            Self::Random => "random",
        };
        write!(f, "{}", text)
    }
}
