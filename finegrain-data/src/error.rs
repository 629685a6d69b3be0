//! Error kinds raised while building datasets.

use thiserror::Error;

/// The designed failure kinds of dataset construction.
///
/// They travel inside [anyhow::Error] and can be recovered with
/// `error.downcast_ref::<DatasetError>()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("dataset '{0}' is not implemented")]
    NotImplemented(String),
    #[error("expect {expect} classes, but found {found} classes in '{root}'")]
    ClassCountMismatch {
        root: String,
        expect: usize,
        found: usize,
    },
    #[error("the key '{key}' is missing in '{source_file}'")]
    MissingKey { key: String, source_file: String },
    #[error("expect exactly {expect} space-separated paths, but get '{data_path}'")]
    MalformedDataPath { data_path: String, expect: usize },
}
