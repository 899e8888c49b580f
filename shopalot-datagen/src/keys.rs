//! Key-space bookkeeping: zero-padded key rendering, chunk assignment, and the id sequences
//! that drive a generation run.

use std::ops::Range;

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A half-open `[start, end)` range of numeric ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub start: u64,
    pub end: u64,
}

impl IdRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: u64) -> bool {
        (self.start..self.end).contains(&id)
    }

    /// Key format whose width is the number of decimal digits in `end`.
    pub fn key_format(&self) -> KeyFormat {
        KeyFormat::for_end(self.end)
    }
}

impl From<Range<u64>> for IdRange {
    fn from(r: Range<u64>) -> Self {
        Self::new(r.start, r.end)
    }
}

/// Number of decimal digits needed to print `n`.
pub fn decimal_width(n: u64) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// Renders numeric keys as fixed-width, zero-padded decimal strings so that string order
/// matches numeric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFormat {
    width: usize,
}

impl KeyFormat {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    pub fn for_end(end: u64) -> Self {
        Self::new(decimal_width(end))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Exclusive upper bound of the ids this format can render, or `None` if every `u64` fits.
    pub fn domain_end(&self) -> Option<u64> {
        u32::try_from(self.width)
            .ok()
            .and_then(|w| 10u64.checked_pow(w))
    }

    /// Renders `id`, failing with [`Error::InvalidRange`] if it needs more than `width` digits.
    pub fn format(&self, id: u64) -> Result<String> {
        match self.domain_end() {
            Some(end) if id >= end => Err(Error::InvalidRange {
                id,
                width: self.width,
            }),
            _ => Ok(format!("{id:0width$}", width = self.width)),
        }
    }
}

/// Bucket of `id` among `chunk_size` buckets.
pub fn chunk_of(id: u64, chunk_size: u64) -> u64 {
    id % chunk_size
}

/// Assigns ids to their chunk bucket and renders the bucket with the id key format.
///
/// The assignment is only stable for a fixed `chunk_size`. Deleting by chunk with a different
/// size than the one used at generation time misses records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPartitioner {
    chunk_size: u64,
    format: KeyFormat,
}

impl ChunkPartitioner {
    pub fn new(chunk_size: u64, format: KeyFormat) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk size must be positive".into()));
        }
        Ok(Self { chunk_size, format })
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn chunk_of(&self, id: u64) -> u64 {
        chunk_of(id, self.chunk_size)
    }

    pub fn chunk_key(&self, id: u64) -> Result<String> {
        self.format.format(self.chunk_of(id))
    }

    /// Renders a bucket number chosen by a caller (e.g. a delete workload).
    pub fn bucket_key(&self, bucket: u64) -> Result<String> {
        if bucket >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk {bucket} does not exist with chunk size {}",
                self.chunk_size
            )));
        }
        self.format.format(bucket)
    }
}

/// The sequence of ids a generation run visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// `start, start + 1, ..., end - 1`, produced lazily.
    Sequential(Range<u64>),
    /// A pre-materialized sample drawn without replacement.
    Sampled(Vec<u64>),
}

impl KeySource {
    pub fn sequential(range: IdRange) -> Self {
        KeySource::Sequential(range.start..range.end)
    }

    /// Draws `count` distinct ids uniformly from `range`, in draw order.
    pub fn random_sample<R: Rng + ?Sized>(range: IdRange, count: u64, rng: &mut R) -> Result<Self> {
        let available = range.len();
        if count > available {
            return Err(Error::SampleTooLarge {
                requested: count,
                available,
            });
        }
        let (Ok(available), Ok(count)) = (usize::try_from(available), usize::try_from(count))
        else {
            return Err(Error::InvalidConfig(format!(
                "sample domain {available} does not fit in memory"
            )));
        };

        let ids = index::sample(rng, available, count)
            .into_iter()
            .map(|offset| range.start + offset as u64)
            .collect();
        Ok(KeySource::Sampled(ids))
    }

    pub fn len(&self) -> usize {
        match self {
            KeySource::Sequential(r) => r.end.saturating_sub(r.start) as usize,
            KeySource::Sampled(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IntoIterator for KeySource {
    type Item = u64;
    type IntoIter = KeySourceIter;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            KeySource::Sequential(r) => KeySourceIter::Sequential(r),
            KeySource::Sampled(ids) => KeySourceIter::Sampled(ids.into_iter()),
        }
    }
}

pub enum KeySourceIter {
    Sequential(Range<u64>),
    Sampled(std::vec::IntoIter<u64>),
}

impl Iterator for KeySourceIter {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        match self {
            KeySourceIter::Sequential(r) => r.next(),
            KeySourceIter::Sampled(ids) => ids.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            KeySourceIter::Sequential(r) => r.size_hint(),
            KeySourceIter::Sampled(ids) => ids.size_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_strategy::proptest;

    use super::*;

    #[test]
    fn width_follows_range_end() {
        assert_eq!(decimal_width(0), 1);
        assert_eq!(decimal_width(5), 1);
        assert_eq!(decimal_width(10), 2);
        assert_eq!(decimal_width(99_999), 5);
        assert_eq!(decimal_width(u64::MAX), 20);
    }

    #[test]
    fn format_pads_and_rejects_overflow() {
        let f = KeyFormat::for_end(50_000);
        assert_eq!(f.format(42).unwrap(), "00042");
        assert!(matches!(
            f.format(100_000),
            Err(Error::InvalidRange { id: 100_000, width: 5 })
        ));
        assert_eq!(KeyFormat::new(20).format(u64::MAX).unwrap(), u64::MAX.to_string());
    }

    #[test]
    fn chunk_keys_for_small_range() {
        let p = ChunkPartitioner::new(2, KeyFormat::for_end(5)).unwrap();
        let chunks: Vec<_> = (0..5).map(|id| p.chunk_key(id).unwrap()).collect();
        assert_eq!(chunks, ["0", "1", "0", "1", "0"]);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(ChunkPartitioner::new(0, KeyFormat::new(3)).is_err());
    }

    #[test]
    fn bucket_key_must_be_a_real_bucket() {
        let p = ChunkPartitioner::new(8, KeyFormat::new(3)).unwrap();
        assert_eq!(p.bucket_key(7).unwrap(), "007");
        assert!(p.bucket_key(8).is_err());
    }

    #[proptest]
    fn chunk_is_modulo(#[strategy(0..1_000_000u64)] id: u64, #[strategy(1..10_000u64)] size: u64) {
        let p = ChunkPartitioner::new(size, KeyFormat::new(7)).unwrap();
        assert_eq!(p.chunk_of(id), id % size);
        assert_eq!(p.chunk_key(id).unwrap(), format!("{:07}", id % size));
        assert_eq!(p.chunk_key(id).unwrap(), p.chunk_key(id).unwrap());
    }

    #[proptest]
    fn sequential_source_is_complete(#[strategy(0..1000u64)] start: u64, #[strategy(0..500u64)] len: u64) {
        let ids: Vec<_> = KeySource::sequential(IdRange::new(start, start + len))
            .into_iter()
            .collect();
        assert_eq!(ids, (start..start + len).collect::<Vec<_>>());
    }

    #[proptest]
    fn sample_is_without_replacement(
        #[strategy(0..1000u64)] start: u64,
        #[strategy(1..300u64)] len: u64,
        seed: u64,
        #[strategy(0..=#len)] count: u64,
    ) {
        let range = IdRange::new(start, start + len);
        let mut rng = StdRng::seed_from_u64(seed);
        let ids: Vec<_> = KeySource::random_sample(range, count, &mut rng)
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(ids.len() as u64, count);
        assert!(ids.iter().all(|id| range.contains(*id)));
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    }

    #[test]
    fn oversized_sample_fails() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            KeySource::random_sample(IdRange::new(0, 3), 4, &mut rng),
            Err(Error::SampleTooLarge {
                requested: 4,
                available: 3
            })
        ));
    }
}
