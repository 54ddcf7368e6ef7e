use crate::app::sources::FileFormat;
use crate::domain::model::{RunDate, RunFlags};
use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "fetchload")]
#[command(about = "Fetch dated snapshots into the archive and load them into the warehouse")]
#[command(group(
    ArgGroup::new("phase")
        .args(["fetch", "load"])
        .required(true)
        .multiple(true)
))]
pub struct CliArgs {
    /// The run date in YYYY-MM-DD format
    #[arg(long = "rundate", value_parser = parse_run_date)]
    pub run_date: RunDate,

    /// Fetch data from the source and archive it
    #[arg(long)]
    pub fetch: bool,

    /// Retrieve archived data and load it into the database
    #[arg(long)]
    pub load: bool,

    /// Select one of the listed source formats
    #[arg(long = "fileformat", value_enum)]
    pub file_format: FileFormat,

    #[arg(long, env = "FETCHLOAD_CONFIG", default_value = "fetchload.toml")]
    pub config: PathBuf,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliArgs {
    pub fn flags(&self) -> RunFlags {
        RunFlags {
            fetch: self.fetch,
            load: self.load,
        }
    }
}

fn parse_run_date(s: &str) -> Result<RunDate, String> {
    RunDate::parse(s).ok_or_else(|| format!("{} is not a valid date in YYYY-MM-DD format", s))
}
