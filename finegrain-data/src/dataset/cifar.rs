use super::*;
use crate::{common::*, processor::TransformPipeline, split::Split};

pub const CIFAR100_NUM_CLASSES: usize = 100;
const CIFAR_IMAGE_SIZE: u32 = 32;
const CIFAR_PIXELS: usize = (CIFAR_IMAGE_SIZE * CIFAR_IMAGE_SIZE) as usize;
/// Coarse label byte, fine label byte and planar RGB pixels.
const CIFAR100_RECORD_SIZE: usize = 2 + 3 * CIFAR_PIXELS;

/// The CIFAR-100 dataset in the binary distribution format.
///
/// ```text
/// root/cifar-100-binary/
///   train.bin
///   test.bin
///   fine_label_names.txt    # optional
/// ```
#[derive(Debug)]
pub struct CifarDataset {
    classes: IndexSet<String>,
    images: Vec<Arc<RgbImage>>,
    labels: Vec<usize>,
    transform: Arc<TransformPipeline>,
}

impl CifarDataset {
    pub async fn load(
        root: impl AsRef<Path>,
        split: Split,
        transform: Arc<TransformPipeline>,
    ) -> Result<Self> {
        let root = root.as_ref();
        let dir = {
            let dir = root.join("cifar-100-binary");
            if dir.is_dir() {
                dir
            } else {
                root.to_owned()
            }
        };

        let classes = {
            let names_file = dir.join("fine_label_names.txt");
            if names_file.is_file() {
                let classes = load_classes_file(&names_file).await?;
                ensure!(
                    classes.len() == CIFAR100_NUM_CLASSES,
                    "expect {} class names in '{}', but get {}",
                    CIFAR100_NUM_CLASSES,
                    names_file.display(),
                    classes.len()
                );
                classes
            } else {
                (0..CIFAR100_NUM_CLASSES)
                    .map(|label| label.to_string())
                    .collect()
            }
        };

        let data_file = dir.join(match split {
            Split::Train => "train.bin",
            Split::Test => "test.bin",
        });
        let bytes = tokio::fs::read(&data_file)
            .await
            .with_context(|| format!("unable to read '{}'", data_file.display()))?;

        let (images, labels) = tokio::task::spawn_blocking(move || decode_cifar100(&bytes))
            .await?
            .with_context(|| format!("malformed CIFAR-100 file '{}'", data_file.display()))?;

        info!(
            "loaded {} CIFAR-100 images from '{}'",
            images.len(),
            data_file.display()
        );

        Ok(Self {
            classes,
            images,
            labels,
            transform,
        })
    }
}

fn decode_cifar100(bytes: &[u8]) -> Result<(Vec<Arc<RgbImage>>, Vec<usize>)> {
    ensure!(
        bytes.len() % CIFAR100_RECORD_SIZE == 0,
        "the file size {} is not a multiple of the record size {}",
        bytes.len(),
        CIFAR100_RECORD_SIZE
    );

    let decoded: Vec<_> = bytes
        .chunks(CIFAR100_RECORD_SIZE)
        .map(|record| -> Result<_> {
            let label = record[1] as usize;
            ensure!(
                label < CIFAR100_NUM_CLASSES,
                "invalid fine label {}",
                label
            );

            let pixels = &record[2..];
            let (red, rest) = pixels.split_at(CIFAR_PIXELS);
            let (green, blue) = rest.split_at(CIFAR_PIXELS);
            let image = RgbImage::from_fn(CIFAR_IMAGE_SIZE, CIFAR_IMAGE_SIZE, |x, y| {
                let index = (y * CIFAR_IMAGE_SIZE + x) as usize;
                Rgb([red[index], green[index], blue[index]])
            });

            Ok((Arc::new(image), label))
        })
        .try_collect()?;

    Ok(decoded.into_iter().unzip())
}

impl GenericDataset for CifarDataset {
    fn num_classes(&self) -> usize {
        self.classes.len()
    }

    fn class_name(&self, label: usize) -> Option<&str> {
        self.classes.get_index(label).map(String::as_str)
    }
}

impl RandomAccessDataset for CifarDataset {
    fn num_records(&self) -> usize {
        self.images.len()
    }

    fn label(&self, index: usize) -> Option<usize> {
        self.labels.get(index).copied()
    }

    fn nth(&self, index: usize) -> Pin<Box<dyn Future<Output = Result<DataRecord>> + Send>> {
        let sample = self
            .images
            .get(index)
            .cloned()
            .zip(self.labels.get(index).copied());
        let transform = self.transform.clone();

        Box::pin(async move {
            let (image, label) = sample.ok_or_else(|| format_err!("invalid index {}", index))?;
            let image =
                tokio::task::spawn_blocking(move || transform.forward((*image).clone())).await??;
            Ok(DataRecord { image, label })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_planar_records() -> Result<()> {
        let mut bytes = vec![0u8; CIFAR100_RECORD_SIZE * 2];
        bytes[1] = 42;
        // red plane of the first image, pixel (x=1, y=0)
        bytes[2 + 1] = 200;
        // blue plane of the second image, pixel (x=0, y=1)
        bytes[CIFAR100_RECORD_SIZE + 1] = 99;
        bytes[CIFAR100_RECORD_SIZE + 2 + 2 * CIFAR_PIXELS + 32] = 77;

        let (images, labels) = decode_cifar100(&bytes)?;
        assert_eq!(labels, vec![42, 99]);
        assert_eq!(images[0].get_pixel(1, 0), &Rgb([200, 0, 0]));
        assert_eq!(images[1].get_pixel(0, 1), &Rgb([0, 0, 77]));
        Ok(())
    }

    #[test]
    fn reject_truncated_file() {
        let bytes = vec![0u8; CIFAR100_RECORD_SIZE + 5];
        assert!(decode_cifar100(&bytes).is_err());
    }
}
