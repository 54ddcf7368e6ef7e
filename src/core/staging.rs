use crate::domain::model::{Payload, ReturnType};
use crate::utils::error::{EtlError, Result};
use std::fs;
use std::path::Path;

/// Writes a fetched payload to its staging file.
///
/// The encoding is picked from the source's declared return type; a payload
/// of a different shape is a contract violation.
pub fn write_payload(path: &Path, declared: ReturnType, payload: Payload) -> Result<()> {
    match (declared, payload) {
        (ReturnType::Bytes, Payload::Bytes(bytes)) => {
            tracing::debug!("Writing {} bytes to {}", bytes.len(), path.display());
            fs::write(path, bytes)?;
        }
        (ReturnType::Text, Payload::Text(text)) => {
            tracing::debug!("Writing {} bytes of text to {}", text.len(), path.display());
            fs::write(path, text.as_bytes())?;
        }
        (ReturnType::Rows, Payload::Rows(rows)) => {
            tracing::debug!("Writing {} rows to {}", rows.len(), path.display());
            let mut writer = csv::WriterBuilder::new()
                .delimiter(b',')
                .has_headers(false)
                .flexible(true)
                .from_path(path)?;
            for row in &rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        (ReturnType::RemoteFiles, _) => {
            return Err(EtlError::ContractViolation {
                message: "remote file lists are retrieved file by file, not staged as a payload"
                    .to_string(),
            });
        }
        (declared, payload) => {
            return Err(EtlError::ContractViolation {
                message: format!(
                    "source declared {} but fetch returned {}",
                    declared,
                    payload.return_type()
                ),
            });
        }
    }
    Ok(())
}

/// Reads a staging file back with the decoding matching `declared`.
pub fn read_payload(path: &Path, declared: ReturnType) -> Result<Payload> {
    match declared {
        ReturnType::Bytes => Ok(Payload::Bytes(fs::read(path)?)),
        ReturnType::Text => Ok(Payload::Text(fs::read_to_string(path)?)),
        ReturnType::Rows => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(path)?;
            let mut rows = Vec::new();
            for record in reader.records() {
                let record = record?;
                rows.push(record.iter().map(str::to_string).collect());
            }
            Ok(Payload::Rows(rows))
        }
        ReturnType::RemoteFiles => Err(EtlError::ContractViolation {
            message: "remote file lists have no staged representation".to_string(),
        }),
    }
}
