//! Dataset construction and random access.

mod cifar;
mod collection;
mod concat;
mod dataset;
mod record;
mod remap;
mod source;
mod streaming;
mod table;
mod utils;

pub use cifar::*;
pub use collection::*;
pub use concat::*;
pub use dataset::*;
pub use record::*;
pub use remap::*;
pub use source::*;
pub use streaming::*;
pub use table::*;
pub use utils::*;
