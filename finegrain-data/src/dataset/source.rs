use super::*;
use crate::{common::*, split::Split, split::SplitMembership};

/// File extensions recognized as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "ppm", "bmp", "pgm", "tif", "tiff", "webp",
];

/// The provider of candidate image records and their split membership.
pub trait RecordSource
where
    Self: Debug + Send + Sync,
{
    /// The directory images are discovered under.
    fn root(&self) -> &Path;

    /// List every candidate record with a dense class index.
    fn list_records(&self) -> Result<RecordList>;

    /// Decide whether the record keyed by `key` belongs to the requested split.
    fn resolve_split(&self, key: &str) -> Result<bool>;

    /// Whether a class may end up with no record after split filtering.
    fn allow_empty_classes(&self) -> bool {
        false
    }
}

/// A folder of class sub-directories without split definition.
#[derive(Debug, Clone)]
pub struct FolderSource {
    root: PathBuf,
}

impl FolderSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_owned(),
        }
    }
}

impl RecordSource for FolderSource {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_records(&self) -> Result<RecordList> {
        scan_class_folders(&self.root)
    }

    fn resolve_split(&self, _key: &str) -> Result<bool> {
        Ok(true)
    }
}

/// The bird dataset layout.
///
/// ```text
/// root/
///   images.txt              # "<id> <class>/<file>"
///   train_test_split.txt    # "<id> <1 for train, 0 for test>"
///   images/<class>/<file>
/// ```
#[derive(Debug, Clone)]
pub struct CubSource {
    image_dir: PathBuf,
    split: Split,
    membership: SplitMembership,
}

impl CubSource {
    pub fn open(root: impl AsRef<Path>, split: Split) -> Result<Self> {
        let root = root.as_ref();
        let membership = SplitMembership::from_text_manifest(
            root.join("images.txt"),
            root.join("train_test_split.txt"),
        )?;

        Ok(Self {
            image_dir: root.join("images"),
            split,
            membership,
        })
    }
}

impl RecordSource for CubSource {
    fn root(&self) -> &Path {
        &self.image_dir
    }

    fn list_records(&self) -> Result<RecordList> {
        scan_class_folders(&self.image_dir)
    }

    fn resolve_split(&self, key: &str) -> Result<bool> {
        self.membership.contains(key, self.split)
    }
}

/// The dog dataset layout.
///
/// ```text
/// root/
///   splits/file_list.mat    # cell array 'file_list' of every image
///   splits/train_list.mat   # cell array 'file_list' of train images
///   Images/<class>/<file>
/// ```
///
/// Test images are the complement of the train list.
#[derive(Debug, Clone)]
pub struct DogSource {
    image_dir: PathBuf,
    split: Split,
    membership: SplitMembership,
}

impl DogSource {
    pub fn open(root: impl AsRef<Path>, split: Split) -> Result<Self> {
        let root = root.as_ref();
        let split_dir = root.join("splits");
        let membership = SplitMembership::from_mat_lists(
            split_dir.join("file_list.mat"),
            split_dir.join("train_list.mat"),
        )?;

        Ok(Self {
            image_dir: root.join("Images"),
            split,
            membership,
        })
    }
}

impl RecordSource for DogSource {
    fn root(&self) -> &Path {
        &self.image_dir
    }

    fn list_records(&self) -> Result<RecordList> {
        scan_class_folders(&self.image_dir)
    }

    fn resolve_split(&self, key: &str) -> Result<bool> {
        self.membership.contains(key, self.split)
    }
}

/// Scan a directory of class sub-directories.
///
/// Classes are the immediate sub-directories in sorted order. Images are
/// searched recursively under each class directory and listed in sorted
/// path order.
pub fn scan_class_folders(root: impl AsRef<Path>) -> Result<RecordList> {
    let root = root.as_ref();
    ensure!(
        root.is_dir(),
        "the image directory '{}' does not exist",
        root.display()
    );

    let class_dirs: Vec<(String, PathBuf)> = {
        let mut class_dirs: Vec<_> = fs::read_dir(root)
            .with_context(|| format!("unable to list '{}'", root.display()))?
            .map(|entry| -> Result<_> {
                let entry = entry?;
                let path = entry.path();
                if !path.is_dir() {
                    return Ok(None);
                }
                let name = entry.file_name().into_string().map_err(|name| {
                    format_err!("the class directory name {:?} is not valid UTF-8", name)
                })?;
                Ok(Some((name, path)))
            })
            .filter_map(|result| result.transpose())
            .try_collect()?;
        class_dirs.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
        class_dirs
    };
    ensure!(
        !class_dirs.is_empty(),
        "no class directories found in '{}'",
        root.display()
    );

    let classes: IndexSet<String> = class_dirs.iter().map(|(name, _)| name.clone()).collect();

    let records: Vec<ImageRecord> = class_dirs
        .iter()
        .enumerate()
        .map(|(label, (_, class_dir))| -> Result<_> {
            let pattern = format!(
                "{}/**/*",
                glob::Pattern::escape(&class_dir.display().to_string())
            );
            let mut files: Vec<PathBuf> = glob::glob(&pattern)?.try_collect()?;
            files.retain(|path| path.is_file() && is_image_file(path));
            files.sort();

            let records: Vec<_> = files
                .into_iter()
                .map(|path| -> Result<_> {
                    let key = relative_key(root, &path)?;
                    Ok(ImageRecord { key, path, label })
                })
                .try_collect()?;
            Ok(records)
        })
        .flatten_ok()
        .try_collect()?;

    Ok(RecordList { classes, records })
}

/// Check the file extension against [IMAGE_EXTENSIONS].
pub fn is_image_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn relative_key(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root)?;
    let components: Vec<&str> = relative
        .components()
        .map(|component| {
            component.as_os_str().to_str().ok_or_else(|| {
                format_err!("the path '{}' is not valid UTF-8", path.display())
            })
        })
        .try_collect()?;
    Ok(components.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) -> Result<()> {
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(path, b"")?;
        Ok(())
    }

    #[test]
    fn scan_sorted_classes_recursively() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        touch(&root.join("zebra/b.JPG"))?;
        touch(&root.join("zebra/a.png"))?;
        touch(&root.join("ant/nested/c.jpeg"))?;
        touch(&root.join("ant/notes.txt"))?;
        touch(&root.join("stray.jpg"))?;

        let RecordList { classes, records } = scan_class_folders(root)?;
        assert_eq!(classes.iter().collect::<Vec<_>>(), vec!["ant", "zebra"]);

        let keys: Vec<_> = records.iter().map(|record| record.key.as_str()).collect();
        assert_eq!(keys, vec!["ant/nested/c.jpeg", "zebra/a.png", "zebra/b.JPG"]);

        let labels: Vec<_> = records.iter().map(|record| record.label).collect();
        assert_eq!(labels, vec![0, 1, 1]);
        Ok(())
    }

    #[test]
    fn missing_root_is_error() {
        assert!(scan_class_folders("/nonexistent/finegrain/root").is_err());
    }
}
