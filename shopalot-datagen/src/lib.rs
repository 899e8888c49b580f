//! Deterministic ShopALot dataset generation.
//!
//! Every record is a pure function of its entity kind, numeric id and [`GeneratorConfig`]: the
//! generator seeds a fresh random source with the id before producing each record, so an id
//! regenerated for an upsert, a delete or a verification query is identical to the one that
//! was loaded. Records come in two shapes:
//!
//! * ATOM, where the one-to-many relationship of an entity (a user's phone, a store's category,
//!   an order's item) is a single nested value, and
//! * SARR, where the same value is wrapped in a one-element array under a plural field name.
//!
//! Both shapes are stamped with a `chunk_id` (`id mod chunk_size`) which workloads use to
//! delete groups of records without a full scan.
//!
//! ```no_run
//! use shopalot_datagen::{run, EntityKind, GeneratorConfig, IdRange, KeySource, MemoryConsumer,
//!                        RecordGenerator};
//!
//! let generator = RecordGenerator::new(GeneratorConfig::new(IdRange::new(0, 5), 2))?;
//! let mut memory = MemoryConsumer::new();
//! run(&generator, EntityKind::User, KeySource::sequential(IdRange::new(0, 5)), &mut memory)?;
//! assert_eq!(memory.len(), 5);
//! # Ok::<(), shopalot_datagen::Error>(())
//! ```

pub mod catalog;
mod config;
pub mod consumer;
mod driver;
mod entity;
mod error;
mod generator;
mod keys;
mod record;
mod sarr;

pub use crate::config::{
    default_time_anchor, DatasetConfig, GeneratorConfig, OutputFiles, ShopALotConfig,
};
pub use crate::consumer::{FileConsumer, MemoryConsumer};
pub use crate::driver::{generate_pair, run, Consumer, Driver};
pub use crate::entity::{EntityKind, Representation};
pub use crate::error::{Error, Result};
pub use crate::generator::RecordGenerator;
pub use crate::keys::{
    chunk_of, decimal_width, ChunkPartitioner, IdRange, KeyFormat, KeySource, KeySourceIter,
};
pub use crate::record::Record;
pub use crate::sarr::to_sarr;
