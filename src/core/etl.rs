use crate::core::processor::FetchLoadProcessor;
use crate::domain::model::RunFlags;
use crate::utils::error::Result;
use std::time::Instant;

/// Runs the requested phases for one run date, fetch before load.
pub struct EtlEngine {
    processor: FetchLoadProcessor,
}

impl EtlEngine {
    pub fn new(processor: FetchLoadProcessor) -> Self {
        Self { processor }
    }

    pub fn processor(&self) -> &FetchLoadProcessor {
        &self.processor
    }

    pub async fn run(&self, flags: RunFlags) -> Result<()> {
        let ctx = self.processor.context();
        let started = Instant::now();
        tracing::info!(
            "🚀 Starting {} run for {} (fetch: {}, load: {})",
            ctx.source_system,
            ctx.run_date,
            flags.fetch,
            flags.load
        );

        if flags.fetch {
            let phase = Instant::now();
            self.processor.fetch_and_archive_to_s3().await?;
            tracing::info!("Fetch phase finished in {:?}", phase.elapsed());
        }

        if flags.load {
            let phase = Instant::now();
            self.processor.load_from_s3_to_db().await?;
            tracing::info!("Load phase finished in {:?}", phase.elapsed());
        }

        tracing::info!("📊 Run complete - Total Time: {:?}", started.elapsed());
        Ok(())
    }
}
