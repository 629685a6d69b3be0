use crate::common::*;

/// The record with image path and label, but without image pixels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRecord {
    /// The `/`-separated path relative to the collection root, used as the
    /// lookup key of split membership.
    pub key: String,
    pub path: PathBuf,
    pub label: usize,
}

/// The record with transformed image pixels and label.
#[derive(Debug, Clone)]
pub struct DataRecord {
    /// The image tensor in `[channels, height, width]` layout.
    pub image: Array3<f32>,
    pub label: usize,
}

/// The candidate records listed by a record source, before split filtering.
#[derive(Debug, Clone)]
pub struct RecordList {
    /// The class names in label order.
    pub classes: IndexSet<String>,
    pub records: Vec<ImageRecord>,
}
