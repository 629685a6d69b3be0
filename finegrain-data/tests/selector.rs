mod common;

use anyhow::Result;
use common::*;
use finegrain_data::{dataset::RandomAccessDataset, error::DatasetError, selector::build_dataset};
use std::{fs, path::Path};

fn dataset_error(err: &anyhow::Error) -> Option<&DatasetError> {
    err.downcast_ref::<DatasetError>()
}

#[tokio::test]
async fn unknown_name_is_not_implemented() {
    let config = config("INAT", Path::new("/data/inat"), 10, 224);
    let err = build_dataset(true, &config).await.unwrap_err();
    assert_eq!(
        dataset_error(&err),
        Some(&DatasetError::NotImplemented("INAT".into()))
    );
}

#[tokio::test]
async fn malformed_dual_path() {
    let config = config("CUB_DOG", Path::new("/data/cub"), 320, 224);
    let err = build_dataset(true, &config).await.unwrap_err();
    assert!(matches!(
        dataset_error(&err),
        Some(DatasetError::MalformedDataPath { .. })
    ));
}

#[tokio::test]
async fn class_count_is_validated() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_cub_fixture(dir.path())?;

    let err = build_dataset(false, &config("CUB", dir.path(), 200, 32))
        .await
        .unwrap_err();
    assert_eq!(
        dataset_error(&err),
        Some(&DatasetError::ClassCountMismatch {
            root: dir.path().join("images").display().to_string(),
            expect: 200,
            found: 3,
        })
    );
    Ok(())
}

#[tokio::test]
async fn image_folder_uses_eval_path() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let train_root = dir.path().join("train");
    let eval_root = dir.path().join("eval");
    for (label, class_name) in ["left", "right"].iter().enumerate() {
        write_image(&train_root.join(class_name).join("a.png"), 12, 12, label)?;
        write_image(&train_root.join(class_name).join("b.png"), 12, 12, label)?;
        write_image(&eval_root.join(class_name).join("c.png"), 12, 12, label)?;
    }

    let mut config = config("image_folder", &train_root, 2, 48);
    assert!(build_dataset(false, &config).await.is_err());

    config.eval_data_path = Some(eval_root);
    let (train, num_classes) = build_dataset(true, &config).await?;
    let (eval, _) = build_dataset(false, &config).await?;
    assert_eq!(num_classes, 2);
    assert_eq!(train.num_records(), 4);
    assert_eq!(eval.num_records(), 2);

    for index in 0..train.num_records() {
        assert_eq!(train.nth(index).await?.image.dim(), (3, 48, 48));
    }
    Ok(())
}

#[tokio::test]
async fn imagenet_layout() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_image(&dir.path().join("train/n01440764/a.jpg"), 20, 16, 0)?;
    write_image(&dir.path().join("val/n01440764/b.jpg"), 20, 16, 0)?;
    write_image(&dir.path().join("val/n01443537/c.jpg"), 20, 16, 1)?;

    let config = config("IMNET", dir.path(), 1000, 64);
    let (dataset, num_classes) = build_dataset(false, &config).await?;
    assert_eq!(num_classes, 1000);
    assert_eq!(dataset.num_records(), 2);
    assert_eq!(dataset.nth(1).await?.label, 1);
    Ok(())
}

#[tokio::test]
async fn food_table() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    fs::create_dir_all(root.join("annot"))?;
    fs::write(root.join("annot/train_info.csv"), "train_1.jpg,250\ntrain_0.jpg,3\n")?;
    fs::write(root.join("annot/val_info.csv"), "val_0.jpg,17\n")?;
    write_image(&root.join("train_set/train_0.jpg"), 30, 30, 0)?;
    write_image(&root.join("train_set/train_1.jpg"), 30, 30, 0)?;
    write_image(&root.join("val_set/val_0.jpg"), 30, 30, 0)?;

    let config = config("FOOD", root, 1000, 32);
    let (train, num_classes) = build_dataset(true, &config).await?;
    assert_eq!(num_classes, 251);
    assert_eq!(train.num_records(), 2);

    let record = train.nth(0).await?;
    assert_eq!(record.label, 250);
    assert_eq!(record.image.dim(), (3, 32, 32));

    let (eval, _) = build_dataset(false, &config).await?;
    assert_eq!(eval.nth(0).await?.label, 17);
    Ok(())
}

#[tokio::test]
async fn cifar_binary() -> Result<()> {
    const RECORD_SIZE: usize = 2 + 3 * 32 * 32;

    let dir = tempfile::tempdir()?;
    let data_dir = dir.path().join("cifar-100-binary");
    fs::create_dir_all(&data_dir)?;

    let mut bytes = vec![128u8; RECORD_SIZE * 3];
    for (index, label) in [5u8, 99, 0].iter().enumerate() {
        bytes[index * RECORD_SIZE] = 0;
        bytes[index * RECORD_SIZE + 1] = *label;
    }
    fs::write(data_dir.join("test.bin"), &bytes)?;

    let config = config("CIFAR", dir.path(), 100, 32);
    let (dataset, num_classes) = build_dataset(false, &config).await?;
    assert_eq!(num_classes, 100);
    assert_eq!(dataset.num_records(), 3);

    let record = dataset.nth(1).await?;
    assert_eq!(record.label, 99);
    assert_eq!(record.image.dim(), (3, 32, 32));

    assert!(build_dataset(true, &config).await.is_err());
    Ok(())
}
