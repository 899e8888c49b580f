use async_trait::async_trait;
use clap::Parser;
use shopalot_datagen::Representation;
use tracing::info;

use crate::benchmark::{BenchContext, WorkloadControl};
use crate::error::Result;
use crate::reporting::marker_entry;

/// Records a point in time, e.g. a configuration change, next to the benchmark entries.
#[derive(Parser, Clone, Debug)]
pub struct Marker {
    /// Free-form description of the marked event
    pub comment: String,
}

#[async_trait]
impl WorkloadControl for Marker {
    fn dataverse(&self) -> Option<Representation> {
        None
    }

    fn restarts_cluster(&self) -> bool {
        false
    }

    async fn benchmark(&self, ctx: &mut BenchContext<'_>) -> Result<()> {
        info!(comment = %self.comment, "Recording marker");
        ctx.sink.record(marker_entry(&self.comment)).await
    }

    async fn post(&self, _: &mut BenchContext<'_>) -> Result<()> {
        Ok(())
    }
}
