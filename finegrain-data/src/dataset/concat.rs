use super::*;
use crate::common::*;

/// The ordered union of datasets with disjoint label spaces.
///
/// Each constituent is shifted by the total class count of the
/// constituents before it, so labels of the union are dense and unique.
#[derive(Debug)]
pub struct ConcatDataset {
    datasets: Vec<ClassOffsetDataset<Box<dyn RandomAccessDataset>>>,
    cumulative_sizes: Vec<usize>,
    num_classes: usize,
}

impl ConcatDataset {
    pub fn new(datasets: Vec<Box<dyn RandomAccessDataset>>) -> Result<Self> {
        ensure!(!datasets.is_empty(), "at least one dataset is required");

        let mut num_records = 0;
        let mut num_classes = 0;

        let (datasets, cumulative_sizes): (Vec<_>, Vec<_>) = datasets
            .into_iter()
            .map(|dataset| {
                let offset = num_classes;
                num_classes += dataset.num_classes();
                num_records += dataset.num_records();
                (ClassOffsetDataset::new(dataset, offset), num_records)
            })
            .unzip();

        Ok(Self {
            datasets,
            cumulative_sizes,
            num_classes,
        })
    }

    /// The label offsets of constituents.
    pub fn offsets(&self) -> Vec<usize> {
        self.datasets.iter().map(|dataset| dataset.offset()).collect()
    }

    pub fn datasets(&self) -> &[ClassOffsetDataset<Box<dyn RandomAccessDataset>>] {
        &self.datasets
    }

    /// Locate the constituent and its local index of a global index.
    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let dataset_index = self
            .cumulative_sizes
            .partition_point(|&cumulative| cumulative <= index);
        if dataset_index >= self.datasets.len() {
            return None;
        }
        let start = match dataset_index {
            0 => 0,
            _ => self.cumulative_sizes[dataset_index - 1],
        };
        Some((dataset_index, index - start))
    }
}

impl GenericDataset for ConcatDataset {
    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn class_name(&self, label: usize) -> Option<&str> {
        self.datasets
            .iter()
            .find(|dataset| {
                let start = dataset.offset();
                (start..(start + dataset.num_classes())).contains(&label)
            })?
            .class_name(label)
    }
}

impl RandomAccessDataset for ConcatDataset {
    fn num_records(&self) -> usize {
        self.cumulative_sizes.last().copied().unwrap_or(0)
    }

    fn label(&self, index: usize) -> Option<usize> {
        let (dataset_index, local_index) = self.locate(index)?;
        self.datasets[dataset_index].label(local_index)
    }

    fn nth(&self, index: usize) -> Pin<Box<dyn Future<Output = Result<DataRecord>> + Send>> {
        match self.locate(index) {
            Some((dataset_index, local_index)) => self.datasets[dataset_index].nth(local_index),
            None => {
                let result: Result<DataRecord> = Err(format_err!(
                    "invalid index {}, the dataset has {} records",
                    index,
                    self.num_records()
                ));
                Box::pin(async move { result })
            }
        }
    }
}
