use super::*;
use crate::common::*;

/// Enumerate a random access dataset in index order.
#[derive(Debug)]
pub struct RandomAccessStream<D>
where
    D: 'static + RandomAccessDataset,
{
    dataset: Arc<D>,
}

impl<D> RandomAccessStream<D>
where
    D: 'static + RandomAccessDataset,
{
    pub fn new(dataset: D) -> Self {
        Self {
            dataset: Arc::new(dataset),
        }
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }
}

impl<D> GenericDataset for RandomAccessStream<D>
where
    D: 'static + RandomAccessDataset,
{
    fn num_classes(&self) -> usize {
        self.dataset.num_classes()
    }

    fn class_name(&self, label: usize) -> Option<&str> {
        self.dataset.class_name(label)
    }
}

impl<D> StreamingDataset for RandomAccessStream<D>
where
    D: 'static + RandomAccessDataset,
{
    fn stream(&self) -> Pin<Box<dyn Stream<Item = Result<DataRecord>> + Send>> {
        let num_records = self.dataset.num_records();
        let dataset = self.dataset.clone();
        let stream = stream::iter(0..num_records).then(move |index| dataset.nth(index));
        Box::pin(stream)
    }
}
