use super::*;
use crate::common::*;

/// The generic dataset trait.
pub trait GenericDataset
where
    Self: Debug + Send + Sync,
{
    /// The number of classes, which is also the exclusive upper bound of
    /// labels produced by this dataset before any offset is applied.
    fn num_classes(&self) -> usize;

    /// The class name of a label produced by this dataset.
    fn class_name(&self, label: usize) -> Option<&str>;
}

/// The dataset with a list of image files.
pub trait FileDataset
where
    Self: GenericDataset,
{
    /// Get the list of image records in the dataset.
    fn records(&self) -> &[Arc<ImageRecord>];
}

/// The dataset that can be random accessed.
pub trait RandomAccessDataset
where
    Self: GenericDataset,
{
    /// Get number of records in the dataset.
    fn num_records(&self) -> usize;

    /// Get the label of the nth record without loading the image.
    fn label(&self, index: usize) -> Option<usize>;

    /// Get the nth record in the dataset.
    fn nth(&self, index: usize) -> Pin<Box<dyn Future<Output = Result<DataRecord>> + Send>>;
}

/// The dataset that can be enumerated through a stream.
pub trait StreamingDataset
where
    Self: GenericDataset,
{
    fn stream(&self) -> Pin<Box<dyn Stream<Item = Result<DataRecord>> + Send>>;
}

impl GenericDataset for Box<dyn RandomAccessDataset> {
    fn num_classes(&self) -> usize {
        self.as_ref().num_classes()
    }

    fn class_name(&self, label: usize) -> Option<&str> {
        self.as_ref().class_name(label)
    }
}

impl RandomAccessDataset for Box<dyn RandomAccessDataset> {
    fn num_records(&self) -> usize {
        self.as_ref().num_records()
    }

    fn label(&self, index: usize) -> Option<usize> {
        self.as_ref().label(index)
    }

    fn nth(&self, index: usize) -> Pin<Box<dyn Future<Output = Result<DataRecord>> + Send>> {
        self.as_ref().nth(index)
    }
}
