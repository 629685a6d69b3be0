mod common;

use anyhow::Result;
use common::*;
use finegrain_data::{
    dataset::{
        ClassOffsetDataset, ConcatDataset, FolderSource, GenericDataset, ImageCollection,
        RandomAccessDataset,
    },
    processor::build_transform,
    selector::build_dataset,
};
use std::{collections::BTreeSet, sync::Arc};

const DOG_KEYS: [&str; 4] = [
    "n02085620-Chihuahua/n02085620_1.jpg",
    "n02085620-Chihuahua/n02085620_2.jpg",
    "n02110185-Siberian_husky/n02110185_1.jpg",
    "n02110185-Siberian_husky/n02110185_2.jpg",
];

#[tokio::test]
async fn bird_and_dog_labels_are_shifted() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let cub_root = dir.path().join("cub");
    let dog_root = dir.path().join("dog");
    let num_cub_test = write_cub_fixture(&cub_root)?.len();
    write_dog_fixture(
        &dog_root,
        &DOG_KEYS,
        &[DOG_KEYS[0], DOG_KEYS[2], "n02099601-golden_retriever/unknown.jpg"],
    )?;

    let mut config = config("CUB_DOG", &cub_root, 5, 32);
    config.data_path = format!("{} {}", cub_root.display(), dog_root.display());

    let (dataset, num_classes) = build_dataset(false, &config).await?;
    assert_eq!(num_classes, 5);
    assert_eq!(dataset.num_records(), num_cub_test + 2);

    let mut labels = vec![];
    for index in 0..dataset.num_records() {
        labels.push(dataset.nth(index).await?.label);
    }

    let (cub_labels, dog_labels) = labels.split_at(num_cub_test);
    assert!(cub_labels.iter().all(|&label| label < 3));
    assert_eq!(dog_labels, &[3, 4]);

    let all_labels: BTreeSet<_> = labels.iter().copied().collect();
    assert_eq!(all_labels, (0..5).collect());

    assert_eq!(dataset.class_name(0), Some("001.alpha"));
    assert_eq!(dataset.class_name(4), Some("n02110185-Siberian_husky"));
    assert_eq!(dataset.class_name(5), None);

    let (train, _) = build_dataset(true, &config).await?;
    assert_eq!(train.num_records(), 9 - num_cub_test + 2);
    Ok(())
}

#[tokio::test]
async fn offsets_accumulate_over_constituents() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let transform = Arc::new(build_transform(
        false,
        &config("image_folder", dir.path(), 1, 8),
    )?);

    let mut datasets: Vec<Box<dyn RandomAccessDataset>> = vec![];
    for (index, num_classes) in [2usize, 1, 3].into_iter().enumerate() {
        let root = dir.path().join(format!("part_{}", index));
        for label in 0..num_classes {
            write_image(
                &root.join(format!("class_{}", label)).join("x.png"),
                8,
                8,
                label,
            )?;
        }
        let collection = ImageCollection::load(FolderSource::new(&root), transform.clone()).await?;
        datasets.push(Box::new(collection));
    }

    let dataset = ConcatDataset::new(datasets)?;
    assert_eq!(dataset.offsets(), vec![0, 2, 3]);
    assert_eq!(dataset.num_classes(), 6);
    assert_eq!(dataset.num_records(), 6);

    for index in 0..6 {
        assert_eq!(dataset.label(index), Some(index));
        assert_eq!(dataset.nth(index).await?.label, index);
    }
    assert_eq!(dataset.label(6), None);

    let class_maps: Vec<Vec<(String, usize)>> = dataset
        .datasets()
        .iter()
        .map(|part| part.class_to_idx().into_iter().collect())
        .collect();
    assert_eq!(
        class_maps,
        vec![
            vec![("class_0".into(), 0), ("class_1".into(), 1)],
            vec![("class_0".into(), 2)],
            vec![
                ("class_0".into(), 3),
                ("class_1".into(), 4),
                ("class_2".into(), 5)
            ],
        ]
    );
    assert!(dataset.nth(6).await.is_err());
    assert!(ConcatDataset::new(vec![]).is_err());
    Ok(())
}

#[tokio::test]
async fn offset_view_shifts_class_map() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_image(&dir.path().join("a/x.png"), 8, 8, 0)?;
    let transform = Arc::new(build_transform(
        false,
        &config("image_folder", dir.path(), 1, 8),
    )?);
    let collection = ImageCollection::load(FolderSource::new(dir.path()), transform).await?;

    let shifted = ClassOffsetDataset::new(collection, 7);
    assert_eq!(
        shifted.class_to_idx().into_iter().collect::<Vec<_>>(),
        vec![("a".to_owned(), 7)]
    );
    assert_eq!(shifted.class_name(7), Some("a"));
    assert_eq!(shifted.class_name(0), None);
    assert_eq!(shifted.nth(0).await?.label, 7);
    Ok(())
}
