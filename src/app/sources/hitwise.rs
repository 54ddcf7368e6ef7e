use crate::config::HitwiseConfig;
use crate::core::cleanup;
use crate::domain::model::{Payload, ReturnType, RunContext};
use crate::domain::ports::{SourceProcessor, WarehouseSession};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{Duration, NaiveDate};
use reqwest::Client;
use std::io::Cursor;
use std::path::Path;

pub const SOURCE_SYSTEM: &str = "hitwise";
pub const FILENAME: &str = "competitor_rankings_weekly.xls";

pub const COLUMNS: [&str; 5] = [
    "week_ending_date",
    "website",
    "domain",
    "total_weekly_visits",
    "weekly_visits_share",
];

/// Workbook sheet, derived CSV and destination table.
pub const SHEETS: [(&str, &str, &str); 2] = [
    ("DFS Competitors", "dfs_competitors.csv", "ddd_staging.hitwise"),
    (
        "DFS Competitors (sections)",
        "dfs_competitors_sections.csv",
        "ddd_staging.hitwise_wider_comparison",
    ),
];

const VISITS_COLUMN: usize = 3;
const SHARE_COLUMN: usize = 4;

/// Weekly competitor rankings spreadsheet pulled from the Hitwise export URL.
pub struct CompetitorRankings {
    config: HitwiseConfig,
    client: Client,
}

impl CompetitorRankings {
    pub fn new(config: HitwiseConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SourceProcessor for CompetitorRankings {
    fn source_system(&self) -> &str {
        SOURCE_SYSTEM
    }

    fn filename(&self) -> Option<&str> {
        Some(FILENAME)
    }

    fn return_type(&self) -> ReturnType {
        ReturnType::Bytes
    }

    async fn fetch(&self, _ctx: &RunContext) -> Result<Payload> {
        tracing::info!("Fetching from {}", self.config.url);
        let response = self
            .client
            .get(&self.config.url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        tracing::debug!("Received {} bytes", body.len());
        Ok(Payload::Bytes(body.to_vec()))
    }

    async fn transform(&self, ctx: &RunContext) -> Result<()> {
        let bytes = std::fs::read(&ctx.paths.file_path)?;
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

        for (sheet, csv_filename, _) in SHEETS {
            tracing::info!("Converting xl sheet {} to {}", sheet, csv_filename);
            let range = workbook.worksheet_range(sheet)?;
            write_sheet_csv(&range, &ctx.paths.local_folder.join(csv_filename))?;
        }
        Ok(())
    }

    fn pre_copy_sql(&self, _ctx: &RunContext) -> Vec<String> {
        SHEETS
            .iter()
            .flat_map(|(_, _, table)| {
                [
                    format!(
                        "create table if not exists {} (
            week_ending_date date null,
            website varchar null,
            \"domain\" varchar null,
            total_weekly_visits float8 null,
            weekly_visits_share float8 null
        )",
                        table
                    ),
                    format!("truncate table {}", table),
                ]
            })
            .collect()
    }

    async fn copy_to_db(
        &self,
        ctx: &RunContext,
        session: &mut dyn WarehouseSession,
    ) -> Result<()> {
        for (_, csv_filename, table) in SHEETS {
            let from_path = ctx.paths.local_folder.join(csv_filename);
            tracing::info!("Copying {} to {}", from_path.display(), table);
            session.copy_csv(table, &from_path, true).await?;
            cleanup::remove_staged_file(&from_path);
        }
        Ok(())
    }

    fn post_copy_sql(&self, ctx: &RunContext) -> Vec<String> {
        if !self.config.track_completeness {
            return Vec::new();
        }
        vec![format!(
            "INSERT INTO ddd_staging.check_staging_completeness(created_date, hitwise)
        VALUES('{}', 'hitwise')
        ON CONFLICT (created_date)
        DO UPDATE SET hitwise = EXCLUDED.hitwise",
            ctx.run_date.iso()
        )]
    }
}

/// Writes one sheet as CSV: the sheet's header row is replaced by [`COLUMNS`]
/// and `<` / `%` markers are stripped from the numeric columns.
fn write_sheet_csv(range: &Range<Data>, target: &Path) -> Result<()> {
    if range.width() != COLUMNS.len() {
        return Err(EtlError::TransformError {
            message: format!(
                "expected {} columns but sheet has {}",
                COLUMNS.len(),
                range.width()
            ),
        });
    }

    let mut writer = csv::Writer::from_path(target)?;
    writer.write_record(COLUMNS)?;

    for row in range.rows().skip(1) {
        let record = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let value = cell_to_string(cell)?;
                Ok(match i {
                    VISITS_COLUMN => value.replace('<', ""),
                    SHARE_COLUMN => value.replace(['<', '%'], ""),
                    _ => value,
                })
            })
            .collect::<Result<Vec<String>>>()?;
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn cell_to_string(cell: &Data) -> Result<String> {
    let value = match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_string(dt.as_f64())?,
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => {
            tracing::warn!("Cell error {:?} written as empty", e);
            String::new()
        }
        #[allow(unreachable_patterns)]
        _ => String::new(),
    };
    Ok(value)
}

/// Excel serial day numbers count from 1899-12-30.
fn excel_serial_to_string(serial: f64) -> Result<String> {
    let out_of_range = || EtlError::TransformError {
        message: format!("date serial {} out of range", serial),
    };
    if !serial.is_finite() {
        return Err(out_of_range());
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).ok_or_else(out_of_range)?;
    let days = Duration::try_days(serial.trunc() as i64).ok_or_else(out_of_range)?;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    let date = epoch.checked_add_signed(days).ok_or_else(out_of_range)?;

    if seconds == 0 {
        return Ok(date.format("%Y-%m-%d").to_string());
    }
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.checked_add_signed(Duration::try_seconds(seconds)?))
        .ok_or_else(out_of_range)?;
    Ok(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}
