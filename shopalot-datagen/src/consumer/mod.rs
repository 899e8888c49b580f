//! Ready-made [`Consumer`](crate::Consumer)s.

mod file;
mod memory;

pub use file::{FileConsumer, FileConsumerBuilder, EIGHTH_STRIDE};
pub use memory::MemoryConsumer;
