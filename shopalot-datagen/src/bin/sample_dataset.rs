use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueHint};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shopalot_datagen::{IdRange, KeySource};
use tracing::info;

/// Copy `n` uniformly chosen lines of a newline-delimited JSON file into another file.
///
/// Lines are chosen without replacement and written in their original order.
#[derive(Parser)]
#[command(name = "sample_dataset")]
struct SampleDataset {
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Number of lines to keep.
    n: u64,

    /// Seed for choosing lines. The same seed and input always select the same lines.
    #[arg(long, default_value = "0")]
    seed: u64,

    #[command(flatten)]
    tracing: shopalot_tracing::Options,
}

fn count_lines(path: &Path) -> anyhow::Result<u64> {
    let reader = BufReader::new(File::open(path)?);
    let mut n = 0;
    for line in reader.lines() {
        line?;
        n += 1;
    }
    Ok(n)
}

impl SampleDataset {
    fn run(self) -> anyhow::Result<()> {
        let total = count_lines(&self.input)
            .with_context(|| format!("reading {}", self.input.display()))?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut chosen: Vec<u64> =
            KeySource::random_sample(IdRange::new(0, total), self.n, &mut rng)?
                .into_iter()
                .collect();
        chosen.sort_unstable();

        let reader = BufReader::new(File::open(&self.input)?);
        let mut writer = BufWriter::new(
            File::create(&self.output)
                .with_context(|| format!("creating {}", self.output.display()))?,
        );
        let mut wanted = chosen.iter().copied().peekable();
        for (number, line) in (0u64..).zip(reader.lines()) {
            let Some(&next) = wanted.peek() else { break };
            let line = line?;
            if number == next {
                writeln!(writer, "{line}")?;
                wanted.next();
            }
        }
        writer.flush()?;

        info!(input = %self.input.display(), total, kept = chosen.len(), "sampled dataset");
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let sample = SampleDataset::parse();
    let _guard = sample.tracing.init("sample_dataset")?;
    sample.run()
}
