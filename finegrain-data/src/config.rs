//! Dataset and preprocessing configuration format.

use crate::{common::*, processor::Interpolation};

/// Dataset and preprocessing options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// The dataset name, one of `CIFAR`, `IMNET`, `image_folder`, `CUB`,
    /// `CUB_DOG` and `FOOD`.
    #[serde(default = "default_data_set")]
    pub data_set: String,
    /// The dataset root. `CUB_DOG` expects two whitespace-separated roots.
    pub data_path: String,
    /// The evaluation root of `image_folder` datasets.
    #[serde(default)]
    pub eval_data_path: Option<PathBuf>,
    /// The declared number of classes.
    #[serde(default = "default_nb_classes")]
    pub nb_classes: usize,
    /// The side length of output images.
    #[serde(default = "default_input_size")]
    pub input_size: NonZeroUsize,
    /// Use ImageNet mean and std, otherwise the inception ones.
    #[serde(default = "default_true")]
    pub imagenet_default_mean_and_std: bool,
    #[serde(default = "default_color_jitter")]
    pub color_jitter: R64,
    /// The RandAugment policy, e.g. `rand-m9-mstd0.5-inc1`.
    #[serde(default = "default_auto_augment")]
    pub auto_augment: Option<String>,
    #[serde(default = "default_train_interpolation")]
    pub train_interpolation: Interpolation,
    /// Random erasing probability.
    #[serde(default = "default_reprob")]
    pub reprob: R64,
    /// Random erasing mode.
    #[serde(default = "default_remode")]
    pub remode: String,
    /// The maximum number of erased regions.
    #[serde(default = "default_recount")]
    pub recount: usize,
    /// The ratio of crop size to resize size at evaluation.
    #[serde(default)]
    pub crop_pct: Option<R64>,
}

impl DatasetConfig {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file '{}'", path.display()))?;
        let config = json5::from_str(&text)
            .with_context(|| format!("unable to parse config file '{}'", path.display()))?;
        Ok(config)
    }

    /// Create a configuration with default options for a dataset.
    pub fn new(data_set: impl Into<String>, data_path: impl Into<String>) -> Self {
        Self {
            data_set: data_set.into(),
            data_path: data_path.into(),
            eval_data_path: None,
            nb_classes: default_nb_classes(),
            input_size: default_input_size(),
            imagenet_default_mean_and_std: true,
            color_jitter: default_color_jitter(),
            auto_augment: default_auto_augment(),
            train_interpolation: default_train_interpolation(),
            reprob: default_reprob(),
            remode: default_remode(),
            recount: default_recount(),
            crop_pct: None,
        }
    }
}

fn default_data_set() -> String {
    "IMNET".into()
}

fn default_nb_classes() -> usize {
    1000
}

fn default_input_size() -> NonZeroUsize {
    NonZeroUsize::new(224).unwrap()
}

fn default_true() -> bool {
    true
}

fn default_color_jitter() -> R64 {
    r64(0.4)
}

fn default_auto_augment() -> Option<String> {
    Some("rand-m9-mstd0.5-inc1".into())
}

fn default_train_interpolation() -> Interpolation {
    Interpolation::Bicubic
}

fn default_reprob() -> R64 {
    r64(0.25)
}

fn default_remode() -> String {
    "pixel".into()
}

fn default_recount() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_defaults() -> Result<()> {
        let config: DatasetConfig = json5::from_str(
            r#"{
                data_set: "CUB",
                data_path: "/data/cub",
                nb_classes: 200,
                auto_augment: null,
            }"#,
        )?;

        assert_eq!(config.data_set, "CUB");
        assert_eq!(config.nb_classes, 200);
        assert_eq!(config.input_size.get(), 224);
        assert!(config.imagenet_default_mean_and_std);
        assert_eq!(config.color_jitter, r64(0.4));
        assert_eq!(config.auto_augment, None);
        assert_eq!(config.train_interpolation, Interpolation::Bicubic);
        assert_eq!(config.remode, "pixel");
        assert_eq!(config.recount, 1);
        assert_eq!(config.crop_pct, None);
        Ok(())
    }

    #[test]
    fn open_reports_path() {
        let err = DatasetConfig::open("/nonexistent/finegrain.json5").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/finegrain.json5"));
    }
}
