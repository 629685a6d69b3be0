pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use futures::{
    future::FutureExt as _,
    stream::{self, Stream, StreamExt as _},
};
pub use image::{imageops::FilterType, Rgb, RgbImage};
pub use indexmap::{IndexMap, IndexSet};
pub use itertools::Itertools as _;
pub use log::{info, warn};
pub use ndarray::{Array3, Axis};
pub use noisy_float::prelude::*;
pub use rand::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use strum::{AsRefStr, EnumString};
pub use std::{
    cmp,
    collections::{HashMap, HashSet},
    fmt,
    fmt::{Debug, Display},
    fs,
    future::Future,
    io::{BufRead, BufReader, Read},
    num::NonZeroUsize,
    path::{Path, PathBuf},
    pin::Pin,
    str::FromStr,
    sync::Arc,
};
