//! Split membership resolution from manifest and split-definition files.

pub mod mat;
mod membership;
mod text;

pub use membership::*;
pub use text::*;
