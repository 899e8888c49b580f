use async_trait::async_trait;
use clap::Parser;
use serde_json::Value;
use shopalot_datagen::{EntityKind, KeySource, RecordGenerator, Representation};
use tracing::{debug, error, info, warn};

use super::{check_indexes, generate_batch, record_generator};
use crate::asterixdb::statements::{self, LookupKey, QueryStyle};
use crate::benchmark::{BenchContext, WorkloadControl};
use crate::error::{Error, Result};

const PHASE: &str = "equality predicate";

/// Looks regenerated records up by the value of their nested field.
///
/// ATOM lookups run twice, with index-only plans enabled and then disabled. SARR lookups run
/// once per query style. Every round draws a fresh sample of ids.
#[derive(Parser, Clone, Debug)]
pub struct EqualityPredicate {
    /// Dataset to query
    #[arg(value_enum)]
    pub dataset: EntityKind,

    /// Dataverse holding the dataset
    #[arg(long, value_enum, default_value = "atom")]
    pub dataverse: Representation,

    /// Queries per round. Defaults to 40 for stores and 500 otherwise.
    #[arg(long)]
    pub queries: Option<u64>,
}

impl EqualityPredicate {
    fn queries(&self) -> u64 {
        self.queries.unwrap_or(match self.dataset {
            EntityKind::Store => 40,
            EntityKind::User | EntityKind::Order => 500,
        })
    }

    /// The rounds to run, as a query style and, for ATOM, whether plans are index-only.
    fn rounds(&self) -> Vec<(QueryStyle, Option<bool>)> {
        match self.dataverse {
            Representation::Atom => vec![
                (QueryStyle::Nested, Some(true)),
                (QueryStyle::Nested, Some(false)),
            ],
            Representation::Sarr => QueryStyle::for_representation(Representation::Sarr)
                .iter()
                .map(|style| (*style, None))
                .collect(),
        }
    }

    async fn round(
        &self,
        ctx: &mut BenchContext<'_>,
        generator: &RecordGenerator,
        style: QueryStyle,
        index_only: Option<bool>,
    ) -> Result<()> {
        let (kind, representation) = (self.dataset, self.dataverse);
        let range = ctx.shopalot.dataset(kind).id_range;
        let ids = KeySource::random_sample(range, self.queries(), &mut ctx.rng)?;
        let records = generate_batch(generator, kind, representation, ids)?;

        info!(
            dataset = %kind,
            dataverse = %representation,
            style = style.label(),
            ?index_only,
            queries = records.len(),
            "Running equality-predicate round"
        );
        for (i, record) in records.iter().enumerate() {
            let run = i + 1;
            let key = LookupKey::from_record(kind, representation, record)?;
            let query = statements::equality_query(kind, representation, style, &key);
            // The setting only holds for the request it is sent with.
            let statement = match index_only {
                Some(enabled) => format!("{} {query}", statements::set_index_only(enabled)),
                None => query,
            };

            let response = ctx.execute(&statement, PHASE, run).await?;
            if response.result_count() == 0 {
                error!(run, %key, "Query found nothing");
                return Err(Error::EmptyResult {
                    run,
                    predicate: key.to_string(),
                });
            }
            debug!(
                run,
                elapsed = response.elapsed_time().unwrap_or("unknown"),
                "Query succeeded"
            );

            let mut fields = vec![
                ("runNumber", Value::from(run)),
                ("queryStyle", Value::from(style.label())),
            ];
            if let Some(enabled) = index_only {
                fields.push(("indexOnly", Value::from(enabled)));
            }
            ctx.record(response, fields).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl WorkloadControl for EqualityPredicate {
    fn dataverse(&self) -> Option<Representation> {
        Some(self.dataverse)
    }

    fn restarts_cluster(&self) -> bool {
        true
    }

    async fn benchmark(&self, ctx: &mut BenchContext<'_>) -> Result<()> {
        let generator = record_generator(ctx, self.dataset)?;
        match check_indexes(ctx, self.dataset).await {
            Err(Error::MissingIndex { index, .. }) => warn!(
                %index,
                "Index not found. Assuming that this is benchmarking non-indexed lookups"
            ),
            other => other?,
        }

        for (style, index_only) in self.rounds() {
            self.round(ctx, &generator, style, index_only).await?;
        }
        Ok(())
    }

    async fn post(&self, _: &mut BenchContext<'_>) -> Result<()> {
        Ok(())
    }
}
