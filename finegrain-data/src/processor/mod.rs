//! Data preprocessing building blocks.

mod builder;
pub mod color;
mod color_jitter;
mod interpolation;
mod normalize;
mod pipeline;
mod rand_augment;
mod random_erasing;
mod resize;

pub use builder::*;
pub use color_jitter::*;
pub use interpolation::*;
pub use normalize::*;
pub use pipeline::*;
pub use rand_augment::*;
pub use random_erasing::*;
pub use resize::*;
