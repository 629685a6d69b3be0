#![allow(dead_code)]

use anyhow::Result;
use finegrain_data::config::DatasetConfig;
use image::{Rgb, RgbImage};
use std::{fs, num::NonZeroUsize, path::Path};

pub const CLASS_NAMES: [&str; 3] = ["001.alpha", "002.beta", "003.gamma"];
pub const IMAGES_PER_CLASS: usize = 3;

/// Write a solid image whose color encodes the label.
pub fn write_image(path: &Path, width: u32, height: u32, label: usize) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let shade = (label * 80) as u8;
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([shade, (x % 256) as u8, (y % 256) as u8])
    });
    image.save(path)?;
    Ok(())
}

/// Write a bird-style dataset with 3 classes of 3 images, flagging every
/// other image as train. Returns the keys of test images.
pub fn write_cub_fixture(root: &Path) -> Result<Vec<String>> {
    let mut images_lines = vec![];
    let mut split_lines = vec![];
    let mut test_keys = vec![];

    for (label, class_name) in CLASS_NAMES.iter().enumerate() {
        for index in 0..IMAGES_PER_CLASS {
            let id = label * IMAGES_PER_CLASS + index + 1;
            let key = format!("{}/image_{}.jpg", class_name, index);
            let (width, height) = [(40, 30), (25, 60), (64, 64)][index];
            write_image(&root.join("images").join(&key), width, height, label)?;

            let is_train = id % 2 == 1;
            images_lines.push(format!("{} {}", id, key));
            split_lines.push(format!("{} {}", id, if is_train { 1 } else { 0 }));
            if !is_train {
                test_keys.push(key);
            }
        }
    }

    fs::write(root.join("images.txt"), images_lines.join("\n") + "\n")?;
    fs::write(root.join("train_test_split.txt"), split_lines.join("\n") + "\n")?;
    Ok(test_keys)
}

/// Write a dog-style dataset whose train list is `train_keys`.
pub fn write_dog_fixture(root: &Path, keys: &[&str], train_keys: &[&str]) -> Result<()> {
    for key in keys {
        write_image(&root.join("Images").join(key), 36, 28, 0)?;
    }

    let split_dir = root.join("splits");
    fs::create_dir_all(&split_dir)?;
    fs::write(split_dir.join("file_list.mat"), mat_file("file_list", keys))?;
    fs::write(
        split_dir.join("train_list.mat"),
        mat_file("file_list", train_keys),
    )?;
    Ok(())
}

pub fn config(data_set: &str, data_path: &Path, nb_classes: usize, input_size: usize) -> DatasetConfig {
    let mut config = DatasetConfig::new(data_set, data_path.display().to_string());
    config.nb_classes = nb_classes;
    config.input_size = NonZeroUsize::new(input_size).unwrap();
    config
}

/// Encode a little-endian MAT v5 file holding one cell array of strings.
pub fn mat_file(name: &str, strings: &[&str]) -> Vec<u8> {
    const MI_INT8: u32 = 1;
    const MI_UINT16: u32 = 4;
    const MI_INT32: u32 = 5;
    const MI_UINT32: u32 = 6;
    const MI_MATRIX: u32 = 14;
    const MX_CELL_CLASS: u8 = 1;
    const MX_CHAR_CLASS: u8 = 4;

    fn element(data_type: u32, data: &[u8]) -> Vec<u8> {
        let mut bytes = vec![];
        bytes.extend(data_type.to_le_bytes());
        bytes.extend((data.len() as u32).to_le_bytes());
        bytes.extend(data);
        bytes.resize(bytes.len() + (8 - data.len() % 8) % 8, 0);
        bytes
    }

    fn matrix(class: u8, dims: &[i32], name: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = vec![];
        body.extend(element(MI_UINT32, &[class, 0, 0, 0, 0, 0, 0, 0]));
        let dims: Vec<u8> = dims.iter().flat_map(|dim| dim.to_le_bytes()).collect();
        body.extend(element(MI_INT32, &dims));
        body.extend(element(MI_INT8, name.as_bytes()));
        body.extend(payload);
        element(MI_MATRIX, &body)
    }

    let cells: Vec<u8> = strings
        .iter()
        .flat_map(|text| {
            let chars: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
            let char_array = matrix(
                MX_CHAR_CLASS,
                &[1, text.len() as i32],
                "",
                &element(MI_UINT16, &chars),
            );
            matrix(MX_CELL_CLASS, &[1, 1], "", &char_array)
        })
        .collect();

    let mut bytes = b"MATLAB 5.0 MAT-file, fixture".to_vec();
    bytes.resize(116, b' ');
    bytes.extend([0u8; 8]);
    bytes.extend(0x0100u16.to_le_bytes());
    bytes.extend(b"IM");
    bytes.extend(matrix(
        MX_CELL_CLASS,
        &[strings.len() as i32, 1],
        name,
        &cells,
    ));
    bytes
}
