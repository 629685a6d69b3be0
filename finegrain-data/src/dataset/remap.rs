use super::*;
use crate::common::*;

/// The dataset view that shifts every label by a fixed offset.
///
/// The offset is applied when records are fetched, so the wrapped dataset
/// keeps its own labels starting from zero.
#[derive(Debug)]
pub struct ClassOffsetDataset<D>
where
    D: RandomAccessDataset,
{
    dataset: D,
    offset: usize,
}

impl<D> ClassOffsetDataset<D>
where
    D: RandomAccessDataset,
{
    pub fn new(dataset: D, offset: usize) -> Self {
        Self { dataset, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn inner(&self) -> &D {
        &self.dataset
    }

    /// The mapping from class name to shifted label.
    pub fn class_to_idx(&self) -> IndexMap<String, usize> {
        (0..self.dataset.num_classes())
            .map(|label| {
                let name = self
                    .dataset
                    .class_name(label)
                    .map(ToOwned::to_owned)
                    .unwrap_or_else(|| label.to_string());
                (name, label + self.offset)
            })
            .collect()
    }
}

impl<D> GenericDataset for ClassOffsetDataset<D>
where
    D: RandomAccessDataset,
{
    fn num_classes(&self) -> usize {
        self.dataset.num_classes()
    }

    fn class_name(&self, label: usize) -> Option<&str> {
        let label = label.checked_sub(self.offset)?;
        self.dataset.class_name(label)
    }
}

impl<D> RandomAccessDataset for ClassOffsetDataset<D>
where
    D: RandomAccessDataset,
{
    fn num_records(&self) -> usize {
        self.dataset.num_records()
    }

    fn label(&self, index: usize) -> Option<usize> {
        Some(self.dataset.label(index)? + self.offset)
    }

    fn nth(&self, index: usize) -> Pin<Box<dyn Future<Output = Result<DataRecord>> + Send>> {
        let offset = self.offset;
        self.dataset
            .nth(index)
            .map(move |result| -> Result<_> {
                let DataRecord { image, label } = result?;
                Ok(DataRecord {
                    image,
                    label: label + offset,
                })
            })
            .boxed()
    }
}
