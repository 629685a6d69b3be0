//! Labeled image datasets and preprocessing pipelines for fine-grained
//! classification.

mod common;
pub mod config;
pub mod dataset;
pub mod error;
pub mod processor;
pub mod selector;
pub mod split;
