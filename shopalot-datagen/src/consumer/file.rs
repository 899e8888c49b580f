use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{DatasetConfig, OutputFiles};
use crate::driver::Consumer;
use crate::error::{Error, Result};
use crate::{Record, Representation};

/// Every record whose 0-based insertion position is a multiple of this goes to the eighth file.
pub const EIGHTH_STRIDE: u64 = 8;

struct Stream {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl Stream {
    fn create(path: PathBuf) -> Result<Self> {
        let file = File::create(&path).map_err(|e| Error::consumer_io(&path, e))?;
        debug!(path = %path.display(), "opened output stream");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    fn write(&mut self, record: &Record) -> Result<()> {
        record
            .write_line(&mut self.writer)
            .map_err(|e| Error::consumer_io(&self.path, e))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::consumer_io(&self.path, e))
    }
}

/// The full, eighth and sample streams of one representation.
struct Streams {
    full: Stream,
    eighth: Option<Stream>,
    sample: Option<Stream>,
}

impl Streams {
    fn open(dir: &Path, files: &OutputFiles) -> Result<Self> {
        let open = |name: &Path| Stream::create(dir.join(name));
        Ok(Self {
            full: open(&files.full_filename)?,
            eighth: files.eighth_filename.as_deref().map(open).transpose()?,
            sample: files.sample_filename.as_deref().map(open).transpose()?,
        })
    }

    fn write(&mut self, record: &Record, position: u64, sample_size: u64) -> Result<()> {
        self.full.write(record)?;
        if let Some(eighth) = self.eighth.as_mut().filter(|_| position % EIGHTH_STRIDE == 0) {
            eighth.write(record)?;
        }
        if let Some(sample) = self.sample.as_mut().filter(|_| position < sample_size) {
            sample.write(record)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.full.flush()?;
        for stream in [self.eighth.as_mut(), self.sample.as_mut()].into_iter().flatten() {
            stream.flush()?;
        }
        Ok(())
    }
}

/// Writes generated records as newline-delimited JSON, one `Full` file per representation plus
/// the optional `Eighth` and `Sample` files.
///
/// Output files are created (truncated) when the consumer is built and are owned by it until
/// [`close`](Consumer::close).
pub struct FileConsumer {
    atom: Option<Streams>,
    sarr: Option<Streams>,
    sample_size: u64,
    position: u64,
}

impl FileConsumer {
    pub fn builder(dir: impl Into<PathBuf>) -> FileConsumerBuilder {
        FileConsumerBuilder {
            dir: dir.into(),
            atom: None,
            sarr: None,
            sample_size: 0,
        }
    }

    /// A consumer writing both representations as laid out by `dataset`, inside `dir`.
    pub fn for_dataset(dir: impl Into<PathBuf>, dataset: &DatasetConfig) -> Result<Self> {
        Self::builder(dir)
            .representation(Representation::Atom, dataset.atom_dataverse.clone())
            .representation(Representation::Sarr, dataset.sarr_dataverse.clone())
            .sample_size(dataset.sample_size)
            .build()
    }
}

impl Consumer for FileConsumer {
    fn consume(&mut self, atom: Record, sarr: Record) -> Result<()> {
        if let Some(streams) = self.atom.as_mut() {
            streams.write(&atom, self.position, self.sample_size)?;
        }
        if let Some(streams) = self.sarr.as_mut() {
            streams.write(&sarr, self.position, self.sample_size)?;
        }
        self.position += 1;
        Ok(())
    }

    /// Flushes and releases every stream. Later calls do nothing.
    fn close(&mut self) -> Result<()> {
        let mut result = Ok(());
        for mut streams in [self.atom.take(), self.sarr.take()].into_iter().flatten() {
            let flushed = streams.flush();
            if result.is_ok() {
                result = flushed;
            }
        }
        result
    }
}

pub struct FileConsumerBuilder {
    dir: PathBuf,
    atom: Option<OutputFiles>,
    sarr: Option<OutputFiles>,
    sample_size: u64,
}

impl FileConsumerBuilder {
    pub fn representation(mut self, representation: Representation, files: OutputFiles) -> Self {
        match representation {
            Representation::Atom => self.atom = Some(files),
            Representation::Sarr => self.sarr = Some(files),
        }
        self
    }

    /// Number of leading records copied to the sample files.
    pub fn sample_size(mut self, n: u64) -> Self {
        self.sample_size = n;
        self
    }

    pub fn build(self) -> Result<FileConsumer> {
        let atom = self
            .atom
            .as_ref()
            .map(|files| Streams::open(&self.dir, files))
            .transpose()?;
        let sarr = self
            .sarr
            .as_ref()
            .map(|files| Streams::open(&self.dir, files))
            .transpose()?;
        Ok(FileConsumer {
            atom,
            sarr,
            sample_size: self.sample_size,
            position: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn files(prefix: &str) -> OutputFiles {
        OutputFiles {
            full_filename: format!("{prefix}Full.json").into(),
            eighth_filename: Some(format!("{prefix}Eighth.json").into()),
            sample_filename: Some(format!("{prefix}Sample.json").into()),
        }
    }

    fn record(n: u64) -> Record {
        let mut r = Record::new();
        r.insert("n", n);
        r
    }

    #[test]
    fn routes_records_to_streams() {
        let dir = tempfile::tempdir().unwrap();
        let mut consumer = FileConsumer::builder(dir.path())
            .representation(Representation::Atom, files("A"))
            .sample_size(3)
            .build()
            .unwrap();
        for n in 0..10 {
            consumer.consume(record(n), record(n)).unwrap();
        }
        consumer.close().unwrap();
        consumer.close().unwrap();

        let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("AFull.json").lines().count(), 10);
        assert_eq!(read("AEighth.json"), "{\"n\":0}\n{\"n\":8}\n");
        assert_eq!(read("ASample.json").lines().count(), 3);
        assert!(!dir.path().join("BFull.json").exists());
    }

    #[test]
    fn missing_directory_is_a_consumer_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileConsumer::builder(dir.path().join("missing"))
            .representation(Representation::Sarr, files("S"))
            .build();
        assert!(matches!(result, Err(Error::ConsumerIo { .. })));
    }
}
