//! The generation driver: walks a [`KeySource`](crate::KeySource), generates both
//! representations of every id, stamps their chunk, and hands the pair to a [`Consumer`].

use tracing::{debug, error, info};

use crate::error::Result;
use crate::generator::RecordGenerator;
use crate::keys::ChunkPartitioner;
use crate::sarr::to_sarr;
use crate::{EntityKind, Record};

/// Receives generated record pairs.
///
/// A consumer owns whatever resources it writes to. The driver calls [`close`](Self::close)
/// exactly once at the end of every run, whether the run succeeded or not.
pub trait Consumer {
    fn consume(&mut self, atom: Record, sarr: Record) -> Result<()>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<F> Consumer for F
where
    F: FnMut(Record, Record) -> Result<()>,
{
    fn consume(&mut self, atom: Record, sarr: Record) -> Result<()> {
        self(atom, sarr)
    }
}

/// Generates the ATOM and SARR records for `id`, both stamped with their `chunk_id`.
pub fn generate_pair(
    generator: &RecordGenerator,
    partitioner: &ChunkPartitioner,
    kind: EntityKind,
    id: u64,
) -> Result<(Record, Record)> {
    let mut atom = generator.generate(kind, id)?;
    let mut sarr = to_sarr(&atom, kind);
    let chunk = partitioner.chunk_key(id)?;
    atom.insert("chunk_id", chunk.clone());
    sarr.insert("chunk_id", chunk);
    Ok((atom, sarr))
}

/// A configured generation run for one entity kind.
#[derive(Debug)]
pub struct Driver<'a> {
    generator: &'a RecordGenerator,
    kind: EntityKind,
    progress_every: Option<u64>,
}

impl<'a> Driver<'a> {
    pub fn new(generator: &'a RecordGenerator, kind: EntityKind) -> Self {
        Self {
            generator,
            kind,
            progress_every: None,
        }
    }

    /// Log an info line after every `n` records. Zero disables progress logging.
    pub fn progress_every(mut self, n: u64) -> Self {
        self.progress_every = (n > 0).then_some(n);
        self
    }

    /// Generates every id in `ids`, in order, and returns how many pairs were consumed.
    ///
    /// The first error stops the run. Output already handed to the consumer is left as is.
    /// The consumer is closed in every case; if both the run and the close fail, the run's
    /// error is returned.
    pub fn run<I, C>(&self, ids: I, consumer: &mut C) -> Result<u64>
    where
        I: IntoIterator<Item = u64>,
        C: Consumer + ?Sized,
    {
        let generated = self.generate_all(ids, consumer);
        let closed = consumer.close();

        match (generated, closed) {
            (Ok(n), Ok(())) => {
                debug!(entity = %self.kind, records = n, "generation run finished");
                Ok(n)
            }
            (Err(e), closed) => {
                if let Err(close_error) = closed {
                    error!(entity = %self.kind, %close_error, "failed to close consumer after a failed run");
                }
                Err(e)
            }
            (Ok(_), Err(e)) => {
                error!(entity = %self.kind, error = %e, "failed to close consumer");
                Err(e)
            }
        }
    }

    fn generate_all<I, C>(&self, ids: I, consumer: &mut C) -> Result<u64>
    where
        I: IntoIterator<Item = u64>,
        C: Consumer + ?Sized,
    {
        let partitioner = self.generator.config().partitioner()?;
        let mut count = 0u64;
        for id in ids {
            let (atom, sarr) = generate_pair(self.generator, &partitioner, self.kind, id)
                .map_err(|e| {
                    error!(entity = %self.kind, id, phase = "generate", error = %e, "record generation failed");
                    e
                })?;
            consumer.consume(atom, sarr).map_err(|e| {
                error!(entity = %self.kind, id, phase = "consume", error = %e, "consumer rejected record");
                e
            })?;
            count += 1;
            if let Some(every) = self.progress_every {
                if count % every == 0 {
                    info!(entity = %self.kind, records = count, "generation progress");
                }
            }
        }
        Ok(count)
    }
}

/// Runs `kind` generation over `ids` with no progress logging. See [`Driver::run`].
pub fn run<I, C>(
    generator: &RecordGenerator,
    kind: EntityKind,
    ids: I,
    consumer: &mut C,
) -> Result<u64>
where
    I: IntoIterator<Item = u64>,
    C: Consumer + ?Sized,
{
    Driver::new(generator, kind).run(ids, consumer)
}
