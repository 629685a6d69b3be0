use super::*;
use crate::{common::*, split::Split};

/// The food dataset layout, where rows of the annotation tables are
/// already split.
///
/// ```text
/// root/
///   annot/train_info.csv    # "<image_name>,<label>" without header
///   annot/val_info.csv
///   train_set/<image_name>
///   val_set/<image_name>
/// ```
#[derive(Debug, Clone)]
pub struct TableSource {
    label_file: PathBuf,
    image_dir: PathBuf,
    num_classes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct TableRow {
    pub image_name: String,
    pub label: usize,
}

impl TableSource {
    pub fn new(root: impl AsRef<Path>, split: Split, num_classes: usize) -> Self {
        let root = root.as_ref();
        let (label_file, image_dir) = match split {
            Split::Train => ("train_info.csv", "train_set"),
            Split::Test => ("val_info.csv", "val_set"),
        };

        Self {
            label_file: root.join("annot").join(label_file),
            image_dir: root.join(image_dir),
            num_classes,
        }
    }

    /// Use explicit label file and image directory.
    pub fn with_files(
        label_file: impl AsRef<Path>,
        image_dir: impl AsRef<Path>,
        num_classes: usize,
    ) -> Self {
        Self {
            label_file: label_file.as_ref().to_owned(),
            image_dir: image_dir.as_ref().to_owned(),
            num_classes,
        }
    }
}

impl RecordSource for TableSource {
    fn root(&self) -> &Path {
        &self.image_dir
    }

    fn list_records(&self) -> Result<RecordList> {
        let rows = load_table_rows(&self.label_file)?;
        let num_classes = self.num_classes;

        let records: Vec<_> = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| -> Result<_> {
                let TableRow { image_name, label } = row;
                ensure!(
                    label < num_classes,
                    "the label {} at row {} of '{}' exceeds the number of classes {}",
                    label,
                    index + 1,
                    self.label_file.display(),
                    num_classes
                );
                Ok(ImageRecord {
                    path: self.image_dir.join(&image_name),
                    key: image_name,
                    label,
                })
            })
            .try_collect()?;

        let classes: IndexSet<_> = (0..num_classes).map(|label| label.to_string()).collect();

        Ok(RecordList { classes, records })
    }

    fn resolve_split(&self, _key: &str) -> Result<bool> {
        Ok(true)
    }

    fn allow_empty_classes(&self) -> bool {
        true
    }
}

/// Parse a headerless `image_name,label` table.
pub fn load_table_rows(label_file: impl AsRef<Path>) -> Result<Vec<TableRow>> {
    let label_file = label_file.as_ref();

    let rows: Vec<TableRow> = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(label_file)
        .with_context(|| format!("unable to open '{}'", label_file.display()))?
        .deserialize::<TableRow>()
        .try_collect()
        .with_context(|| format!("malformed annotation table '{}'", label_file.display()))?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_rows_in_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        fs::create_dir_all(root.join("annot"))?;
        fs::write(
            root.join("annot/val_info.csv"),
            "val_000002.jpg,7\nval_000001.jpg,0\n",
        )?;

        let source = TableSource::new(root, Split::Test, 10);
        let RecordList { classes, records } = source.list_records()?;
        assert_eq!(classes.len(), 10);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, "val_000002.jpg");
        assert_eq!(records[0].label, 7);
        assert_eq!(records[1].path, root.join("val_set").join("val_000001.jpg"));
        Ok(())
    }

    #[test]
    fn reject_out_of_range_label() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        fs::create_dir_all(root.join("annot"))?;
        fs::write(root.join("annot/train_info.csv"), "train_1.jpg,3\n")?;

        let source = TableSource::new(root, Split::Train, 3);
        assert!(source.list_records().is_err());
        Ok(())
    }
}
