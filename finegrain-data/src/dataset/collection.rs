use super::*;
use crate::{common::*, processor::TransformPipeline};

/// The indexed collection of images filtered by split membership.
#[derive(Debug)]
pub struct ImageCollection {
    root: PathBuf,
    classes: IndexSet<String>,
    records: Vec<Arc<ImageRecord>>,
    transform: Arc<TransformPipeline>,
}

impl ImageCollection {
    /// Scan the source and keep the records of the requested split.
    ///
    /// The scan runs on a blocking thread and completes before the
    /// collection is returned.
    pub async fn load<S>(source: S, transform: Arc<TransformPipeline>) -> Result<Self>
    where
        S: 'static + RecordSource,
    {
        tokio::task::spawn_blocking(move || Self::from_source(&source, transform)).await?
    }

    /// Scan the source on the current thread.
    pub fn from_source<S>(source: &S, transform: Arc<TransformPipeline>) -> Result<Self>
    where
        S: RecordSource + ?Sized,
    {
        let root = source.root().to_owned();
        let RecordList { classes, records } = source.list_records()?;

        let records: Vec<_> = records
            .into_iter()
            .map(|record| -> Result<_> {
                let keep = source.resolve_split(&record.key)?;
                Ok(keep.then(|| Arc::new(record)))
            })
            .filter_map(|result| result.transpose())
            .try_collect()?;

        if !source.allow_empty_classes() {
            let mut counts = vec![0usize; classes.len()];
            records.iter().for_each(|record| counts[record.label] += 1);

            let empty_classes: Vec<_> = classes
                .iter()
                .zip(counts)
                .filter(|(_, count)| *count == 0)
                .map(|(name, _)| name.as_str())
                .collect();

            ensure!(
                empty_classes.is_empty(),
                "found no valid file for the classes {} in '{}'",
                empty_classes.join(", "),
                root.display()
            );
        }

        info!(
            "loaded {} images of {} classes from '{}'",
            records.len(),
            classes.len(),
            root.display()
        );

        Ok(Self {
            root,
            classes,
            records,
            transform,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The class names in label order.
    pub fn classes(&self) -> &IndexSet<String> {
        &self.classes
    }

    /// The mapping from class name to label.
    pub fn class_to_idx(&self) -> IndexMap<String, usize> {
        self.classes
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect()
    }

    pub fn transform(&self) -> &Arc<TransformPipeline> {
        &self.transform
    }
}

impl GenericDataset for ImageCollection {
    fn num_classes(&self) -> usize {
        self.classes.len()
    }

    fn class_name(&self, label: usize) -> Option<&str> {
        self.classes.get_index(label).map(String::as_str)
    }
}

impl FileDataset for ImageCollection {
    fn records(&self) -> &[Arc<ImageRecord>] {
        &self.records
    }
}

impl RandomAccessDataset for ImageCollection {
    fn num_records(&self) -> usize {
        self.records.len()
    }

    fn label(&self, index: usize) -> Option<usize> {
        Some(self.records.get(index)?.label)
    }

    fn nth(&self, index: usize) -> Pin<Box<dyn Future<Output = Result<DataRecord>> + Send>> {
        let record = self.records.get(index).cloned();
        let transform = self.transform.clone();

        Box::pin(async move {
            let record = record.ok_or_else(|| format_err!("invalid index {}", index))?;
            let label = record.label;

            let image = tokio::task::spawn_blocking(move || transform.load(&record.path))
                .await??;

            Ok(DataRecord { image, label })
        })
    }
}
