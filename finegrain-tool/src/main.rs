use anyhow::{ensure, Result};
use clap::Parser;
use finegrain_data::{
    config::DatasetConfig,
    dataset::{GenericDataset, RandomAccessDataset, RandomAccessStream, StreamingDataset},
    processor::build_transform,
    selector::build_dataset,
};
use futures::stream::StreamExt as _;
use itertools::Itertools as _;
use log::warn;
use prettytable::{cell, row, Table};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
enum Opts {
    /// Show classes and record counts of a dataset.
    Info {
        /// configuration file
        config_file: PathBuf,
        /// use the evaluation split
        #[clap(long)]
        eval: bool,
    },
    /// Show the preprocessing pipeline.
    Transform {
        /// configuration file
        config_file: PathBuf,
        /// use the evaluation pipeline
        #[clap(long)]
        eval: bool,
    },
    /// Load one record and show its tensor statistics.
    Fetch {
        /// configuration file
        config_file: PathBuf,
        /// record index
        index: usize,
        /// use the evaluation split
        #[clap(long)]
        eval: bool,
    },
    /// Load every record in order and report failures.
    Scan {
        /// configuration file
        config_file: PathBuf,
        /// use the evaluation split
        #[clap(long)]
        eval: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    match Opts::parse() {
        Opts::Info { config_file, eval } => {
            let config = DatasetConfig::open(config_file)?;
            info(&config, !eval).await?;
        }
        Opts::Transform { config_file, eval } => {
            let config = DatasetConfig::open(config_file)?;
            let pipeline = build_transform(!eval, &config)?;
            println!("{}", pipeline);
        }
        Opts::Fetch {
            config_file,
            index,
            eval,
        } => {
            let config = DatasetConfig::open(config_file)?;
            fetch(&config, !eval, index).await?;
        }
        Opts::Scan { config_file, eval } => {
            let config = DatasetConfig::open(config_file)?;
            scan(&config, !eval).await?;
        }
    }

    Ok(())
}

async fn info(config: &DatasetConfig, is_train: bool) -> Result<()> {
    let (dataset, num_classes) = build_dataset(is_train, config).await?;
    let counts = (0..dataset.num_records())
        .filter_map(|index| dataset.label(index))
        .counts();

    println!("classes: {}", num_classes);
    println!("records: {}", dataset.num_records());

    let mut table = Table::new();
    table.add_row(row!["label", "class", "records"]);
    (0..num_classes).for_each(|label| {
        table.add_row(row![
            label,
            dataset.class_name(label).unwrap_or("-"),
            counts.get(&label).copied().unwrap_or(0),
        ]);
    });
    table.printstd();

    Ok(())
}

async fn fetch(config: &DatasetConfig, is_train: bool, index: usize) -> Result<()> {
    let (dataset, _) = build_dataset(is_train, config).await?;
    ensure!(
        index < dataset.num_records(),
        "index {} is out of range, the dataset has {} records",
        index,
        dataset.num_records()
    );

    let record = dataset.nth(index).await?;
    let (channels, height, width) = record.image.dim();

    let mut table = Table::new();
    table.add_row(row!["index", "label", "class", "shape"]);
    table.add_row(row![
        index,
        record.label,
        dataset.class_name(record.label).unwrap_or("-"),
        format!("{}x{}x{}", channels, height, width),
    ]);
    table.printstd();

    let mut table = Table::new();
    table.add_row(row!["channel", "mean", "min", "max"]);
    record
        .image
        .outer_iter()
        .enumerate()
        .for_each(|(channel, values)| {
            let mean = values.mean().unwrap_or(f32::NAN);
            let (min, max) = values
                .iter()
                .copied()
                .minmax_by(|lhs, rhs| lhs.total_cmp(rhs))
                .into_option()
                .unwrap_or((f32::NAN, f32::NAN));
            table.add_row(row![
                channel,
                format!("{:.4}", mean),
                format!("{:.4}", min),
                format!("{:.4}", max),
            ]);
        });
    table.printstd();

    Ok(())
}

async fn scan(config: &DatasetConfig, is_train: bool) -> Result<()> {
    let (dataset, _) = build_dataset(is_train, config).await?;
    let num_records = dataset.num_records();

    let num_failures = RandomAccessStream::new(dataset)
        .stream()
        .enumerate()
        .fold(0usize, |num_failures, (index, result)| async move {
            match result {
                Ok(_) => num_failures,
                Err(err) => {
                    warn!("failed to load record {}: {:#}", index, err);
                    num_failures + 1
                }
            }
        })
        .await;

    println!(
        "loaded {} of {} records",
        num_records - num_failures,
        num_records
    );
    ensure!(num_failures == 0, "{} records failed to load", num_failures);
    Ok(())
}
