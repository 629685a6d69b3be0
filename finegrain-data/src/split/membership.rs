use super::{mat, read_id_value_lines};
use crate::{common::*, error::DatasetError};

/// The dataset partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn from_is_train(is_train: bool) -> Self {
        if is_train {
            Self::Train
        } else {
            Self::Test
        }
    }

    pub fn is_train(&self) -> bool {
        matches!(self, Self::Train)
    }
}

impl FromStr for Split {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let split = match text {
            "train" => Self::Train,
            "test" | "eval" | "val" => Self::Test,
            _ => bail!("invalid split name '{}'", text),
        };
        Ok(split)
    }
}

impl Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// The lookup from file key to the partition it belongs to.
///
/// The key is the image path relative to the image root, `/`-separated.
#[derive(Debug, Clone)]
pub struct SplitMembership {
    source_file: PathBuf,
    splits: HashMap<String, Split>,
}

impl SplitMembership {
    /// Build membership from an `id path` manifest and an `id flag`
    /// split-definition file, where flag `1` is train and `0` is test.
    pub fn from_text_manifest(
        images_file: impl AsRef<Path>,
        split_file: impl AsRef<Path>,
    ) -> Result<Self> {
        let images_file = images_file.as_ref();
        let split_file = split_file.as_ref();

        let id_to_name: HashMap<_, _> = read_id_value_lines(images_file)?.into_iter().collect();

        let splits: HashMap<_, _> = read_id_value_lines(split_file)?
            .into_iter()
            .map(|(id, flag)| -> Result<_> {
                let name = id_to_name.get(&id).ok_or_else(|| DatasetError::MissingKey {
                    key: id.clone(),
                    source_file: images_file.display().to_string(),
                })?;
                let split = match flag.as_str() {
                    "1" => Split::Train,
                    "0" => Split::Test,
                    _ => bail!(
                        "invalid split flag '{}' for image id '{}' in '{}'",
                        flag,
                        id,
                        split_file.display()
                    ),
                };
                Ok((name.clone(), split))
            })
            .try_collect()?;

        Ok(Self {
            source_file: split_file.to_owned(),
            splits,
        })
    }

    /// Build membership from a complete file list and a train file list.
    ///
    /// A file is in train iff it is listed in `train_files`, and in test iff
    /// it is not. No independent test list is consulted.
    pub fn from_file_lists<A, T>(
        source_file: impl AsRef<Path>,
        all_files: A,
        train_files: T,
    ) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let train_files: HashSet<String> = train_files.into_iter().map(Into::into).collect();

        let splits: HashMap<_, _> = all_files
            .into_iter()
            .map(|file| {
                let file: String = file.into();
                let split = if train_files.contains(&file) {
                    Split::Train
                } else {
                    Split::Test
                };
                (file, split)
            })
            .collect();

        let num_unknown = train_files
            .iter()
            .filter(|file| !splits.contains_key(*file))
            .count();
        if num_unknown > 0 {
            warn!(
                "ignored {} train list entries absent from the file list",
                num_unknown
            );
        }

        Self {
            source_file: source_file.as_ref().to_owned(),
            splits,
        }
    }

    /// Build membership from the `file_list` variables of two MAT files.
    pub fn from_mat_lists(
        file_list_mat: impl AsRef<Path>,
        train_list_mat: impl AsRef<Path>,
    ) -> Result<Self> {
        let file_list_mat = file_list_mat.as_ref();
        let train_list_mat = train_list_mat.as_ref();

        let all_files = mat::load_cell_strings(file_list_mat, "file_list")?;
        let train_files = mat::load_cell_strings(train_list_mat, "file_list")?;

        Ok(Self::from_file_lists(file_list_mat, all_files, train_files))
    }

    /// Check whether the file keyed by `key` belongs to `split`.
    pub fn contains(&self, key: &str, split: Split) -> Result<bool> {
        let found = self.splits.get(key).ok_or_else(|| DatasetError::MissingKey {
            key: key.to_owned(),
            source_file: self.source_file.display().to_string(),
        })?;
        Ok(*found == split)
    }

    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    /// Count the files in each partition.
    pub fn count(&self, split: Split) -> usize {
        self.splits.values().filter(|&&found| found == split).count()
    }
}
