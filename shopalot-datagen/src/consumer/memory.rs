use crate::driver::Consumer;
use crate::error::Result;
use crate::Record;

/// Accumulates generated pairs in memory, for batches small enough to be fed straight into a
/// single statement.
#[derive(Debug, Default, Clone)]
pub struct MemoryConsumer {
    pub atom: Vec<Record>,
    pub sarr: Vec<Record>,
}

impl MemoryConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            atom: Vec::with_capacity(capacity),
            sarr: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.atom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atom.is_empty()
    }

    /// Empties both lists, keeping their allocations for the next batch.
    pub fn reset(&mut self) {
        self.atom.clear();
        self.sarr.clear();
    }

    pub fn into_parts(self) -> (Vec<Record>, Vec<Record>) {
        (self.atom, self.sarr)
    }
}

impl Consumer for MemoryConsumer {
    fn consume(&mut self, atom: Record, sarr: Record) -> Result<()> {
        self.atom.push(atom);
        self.sarr.push(sarr);
        Ok(())
    }
}
