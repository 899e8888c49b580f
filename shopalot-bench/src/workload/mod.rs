//! The ShopALot workloads and the key-space planning behind them.

use shopalot_datagen::{
    EntityKind, KeySource, MemoryConsumer, Record, RecordGenerator, Representation,
};
use tracing::{error, info};

use crate::asterixdb::statements;
use crate::benchmark::BenchContext;
use crate::error::{Error, Result};

mod equality_predicate;
mod insert_upsert_delete;
mod marker;
pub mod plan;

pub use equality_predicate::EqualityPredicate;
pub use insert_upsert_delete::InsertUpsertDelete;
pub use marker::Marker;

/// Looks up every secondary index of `kind` in both dataverses, returning the first one missing
/// as an [`Error::MissingIndex`].
pub(crate) async fn check_indexes(ctx: &BenchContext<'_>, kind: EntityKind) -> Result<()> {
    for index in statements::secondary_indexes(kind) {
        for representation in [Representation::Atom, Representation::Sarr] {
            info!(%index, dataverse = representation.dataverse(), "Checking that the index exists");
            let response = ctx
                .execute(
                    &statements::index_exists(index, representation, kind),
                    "index check",
                    0,
                )
                .await?;
            if response.result_count() == 0 {
                error!(%index, dataverse = representation.dataverse(), "Index does not exist");
                return Err(Error::MissingIndex {
                    index: (*index).to_owned(),
                    dataverse: statements::dataverse(representation),
                    dataset: kind.dataset_name().to_owned(),
                });
            }
        }
    }
    Ok(())
}

/// A generator for `kind`, refusing configs that could not produce every record of it.
pub(crate) fn record_generator(ctx: &BenchContext<'_>, kind: EntityKind) -> Result<RecordGenerator> {
    let config = ctx.shopalot.generator_config(kind);
    config.validate(kind)?;
    Ok(RecordGenerator::new(config)?)
}

/// Generates `ids` and keeps the records of `representation`, in id order.
pub(crate) fn generate_batch(
    generator: &RecordGenerator,
    kind: EntityKind,
    representation: Representation,
    ids: KeySource,
) -> Result<Vec<Record>> {
    let mut memory = MemoryConsumer::with_capacity(ids.len());
    shopalot_datagen::run(generator, kind, ids, &mut memory)?;
    let (atom, sarr) = memory.into_parts();
    Ok(match representation {
        Representation::Atom => atom,
        Representation::Sarr => sarr,
    })
}
