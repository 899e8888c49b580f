use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, ValueHint};
use shopalot_datagen::{
    Driver, EntityKind, FileConsumer, KeySource, RecordGenerator, ShopALotConfig,
};
use tracing::info;

/// Materialize a ShopALot dataset as newline-delimited JSON.
///
/// Writes the `Full` file, plus the `Eighth` and `Sample` files when configured, for both the
/// ATOM and the SARR representation of the chosen entity.
#[derive(Parser)]
#[command(name = "shopalot_datagen")]
struct DataGenerator {
    /// Entity to generate.
    #[arg(value_enum)]
    dataset: EntityKind,

    /// Path to the dataset config file.
    #[arg(long, default_value = "config/shopalot.json", value_hint = ValueHint::FilePath)]
    config: PathBuf,

    /// Directory the output files are created in.
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    output_dir: PathBuf,

    /// Log progress after this many records. 0 disables progress logging.
    #[arg(long, default_value = "100000")]
    progress_every: u64,

    #[command(flatten)]
    tracing: shopalot_tracing::Options,
}

impl DataGenerator {
    fn run(self) -> anyhow::Result<()> {
        let config = ShopALotConfig::from_path(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;
        let dataset = config.dataset(self.dataset);
        let generator_config = config.generator_config(self.dataset);
        generator_config.validate(self.dataset)?;
        let generator = RecordGenerator::new(generator_config)?;

        let mut consumer = FileConsumer::for_dataset(&self.output_dir, dataset)
            .context("opening output files")?;

        info!(
            entity = %self.dataset,
            start = dataset.id_range.start,
            end = dataset.id_range.end,
            chunk_size = dataset.chunk_size,
            "generating dataset"
        );
        let started = Instant::now();
        let written = Driver::new(&generator, self.dataset)
            .progress_every(self.progress_every)
            .run(KeySource::sequential(dataset.id_range), &mut consumer)
            .with_context(|| format!("generating {} records", self.dataset))?;

        info!(
            entity = %self.dataset,
            records = written,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dataset written"
        );
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let data_generator = DataGenerator::parse();
    let _guard = data_generator.tracing.init("shopalot_datagen")?;
    data_generator.run()
}
