//! Dispatch a dataset name to a constructed dataset.

use crate::{
    common::*,
    config::DatasetConfig,
    dataset::{
        CifarDataset, ConcatDataset, CubSource, DogSource, FolderSource, GenericDataset,
        ImageCollection, RandomAccessDataset, RecordSource, TableSource, CIFAR100_NUM_CLASSES,
    },
    error::DatasetError,
    processor::{build_transform, TransformPipeline},
    split::Split,
};

pub const IMAGENET_NUM_CLASSES: usize = 1000;
pub const FOOD_NUM_CLASSES: usize = 251;

/// The supported datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr)]
pub enum DatasetName {
    #[strum(serialize = "CIFAR")]
    Cifar,
    #[strum(serialize = "IMNET")]
    ImageNet,
    #[strum(serialize = "image_folder")]
    ImageFolder,
    #[strum(serialize = "CUB")]
    Cub,
    #[strum(serialize = "CUB_DOG")]
    CubDog,
    #[strum(serialize = "FOOD")]
    Food,
}

/// Build the train or evaluation dataset and return it along with its
/// number of classes.
pub async fn build_dataset(
    is_train: bool,
    config: &DatasetConfig,
) -> Result<(Box<dyn RandomAccessDataset>, usize)> {
    let name: DatasetName = config
        .data_set
        .parse()
        .map_err(|_| DatasetError::NotImplemented(config.data_set.clone()))?;

    let transform = Arc::new(build_transform(is_train, config)?);
    info!("transform pipeline:\n{}", transform);
    let split = Split::from_is_train(is_train);
    let data_path = config.data_path.trim();

    let (dataset, num_classes): (Box<dyn RandomAccessDataset>, usize) = match name {
        DatasetName::Cifar => {
            let dataset = CifarDataset::load(data_path, split, transform).await?;
            (Box::new(dataset), CIFAR100_NUM_CLASSES)
        }
        DatasetName::ImageNet => {
            let root = Path::new(data_path).join(if is_train { "train" } else { "val" });
            let dataset =
                load_collection(move || Ok(FolderSource::new(root)), transform).await?;
            (Box::new(dataset), IMAGENET_NUM_CLASSES)
        }
        DatasetName::ImageFolder => {
            let root = if is_train {
                PathBuf::from(data_path)
            } else {
                config.eval_data_path.clone().ok_or_else(|| {
                    format_err!("eval_data_path is required to evaluate image_folder datasets")
                })?
            };
            let dataset =
                load_collection(move || Ok(FolderSource::new(root)), transform).await?;
            check_num_classes(&dataset, config.nb_classes)?;
            (Box::new(dataset), config.nb_classes)
        }
        DatasetName::Cub => {
            let root = PathBuf::from(data_path);
            let dataset =
                load_collection(move || CubSource::open(root, split), transform).await?;
            check_num_classes(&dataset, config.nb_classes)?;
            (Box::new(dataset), config.nb_classes)
        }
        DatasetName::CubDog => {
            let (cub_root, dog_root) = split_dual_path(data_path)?;
            let cub = load_collection(
                move || CubSource::open(cub_root, split),
                transform.clone(),
            )
            .await?;
            let dog = load_collection(move || DogSource::open(dog_root, split), transform).await?;

            let datasets: Vec<Box<dyn RandomAccessDataset>> = vec![Box::new(cub), Box::new(dog)];
            let dataset = ConcatDataset::new(datasets)?;
            let num_classes = dataset.num_classes();
            if num_classes != config.nb_classes {
                warn!(
                    "the combined dataset has {} classes, but nb_classes is {}",
                    num_classes, config.nb_classes
                );
            }
            (Box::new(dataset), num_classes)
        }
        DatasetName::Food => {
            let source = TableSource::new(data_path, split, FOOD_NUM_CLASSES);
            let dataset = load_collection(move || Ok(source), transform).await?;
            (Box::new(dataset), FOOD_NUM_CLASSES)
        }
    };

    info!(
        "built {} dataset with {} records and {} classes",
        name.as_ref(),
        dataset.num_records(),
        num_classes
    );

    Ok((dataset, num_classes))
}

async fn load_collection<F, S>(open: F, transform: Arc<TransformPipeline>) -> Result<ImageCollection>
where
    F: 'static + Send + FnOnce() -> Result<S>,
    S: RecordSource,
{
    tokio::task::spawn_blocking(move || {
        let source = open()?;
        ImageCollection::from_source(&source, transform)
    })
    .await?
}

fn check_num_classes(dataset: &ImageCollection, expect: usize) -> Result<()> {
    let found = dataset.num_classes();
    if found != expect {
        return Err(DatasetError::ClassCountMismatch {
            root: dataset.root().display().to_string(),
            expect,
            found,
        }
        .into());
    }
    Ok(())
}

/// Split a path string of exactly two whitespace-separated paths.
pub fn split_dual_path(data_path: &str) -> Result<(PathBuf, PathBuf)> {
    let paths: Vec<_> = data_path.split_whitespace().collect();
    match paths.as_slice() {
        [first, second] => Ok((Path::new(first).to_owned(), Path::new(second).to_owned())),
        _ => Err(DatasetError::MalformedDataPath {
            data_path: data_path.to_owned(),
            expect: 2,
        }
        .into()),
    }
}
