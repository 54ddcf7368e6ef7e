pub mod hitwise;

use crate::config::EtlConfig;
use crate::domain::ports::SourceProcessor;
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use clap::ValueEnum;

pub use hitwise::CompetitorRankings;

/// Source formats selectable with `--fileformat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileFormat {
    #[value(name = "competitor_rankings")]
    CompetitorRankings,
}

impl FileFormat {
    /// Instantiates the source for this format from its config section.
    pub fn build(&self, config: &EtlConfig) -> Result<Box<dyn SourceProcessor>> {
        match self {
            FileFormat::CompetitorRankings => {
                let settings = validate_required_field("sources.hitwise", &config.sources.hitwise)?;
                Ok(Box::new(CompetitorRankings::new(settings.clone())))
            }
        }
    }
}
