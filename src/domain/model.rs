use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;

/// The calendar date a batch is run for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunDate(NaiveDate);

impl RunDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parses the `YYYY-MM-DD` form accepted on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// `YYYY-MM-DD`
    pub fn iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// `YYYYMMDD`, used in staging paths and archive keys.
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }
}

impl fmt::Display for RunDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iso())
    }
}

/// Shape of the payload a source's fetch returns. Fixed per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Bytes,
    Text,
    Rows,
    RemoteFiles,
}

impl ReturnType {
    pub fn is_multi_file(&self) -> bool {
        matches!(self, ReturnType::RemoteFiles)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReturnType::Bytes => "bytes",
            ReturnType::Text => "text",
            ReturnType::Rows => "rows",
            ReturnType::RemoteFiles => "remote_files",
        };
        f.write_str(name)
    }
}

pub type Row = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Bytes(Vec<u8>),
    Text(String),
    Rows(Vec<Row>),
    RemoteFiles(Vec<String>),
}

impl Payload {
    pub fn return_type(&self) -> ReturnType {
        match self {
            Payload::Bytes(_) => ReturnType::Bytes,
            Payload::Text(_) => ReturnType::Text,
            Payload::Rows(_) => ReturnType::Rows,
            Payload::RemoteFiles(_) => ReturnType::RemoteFiles,
        }
    }
}

/// Location of a snapshot in the archive store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveKey {
    pub bucket: String,
    pub key: String,
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Staging and archive locations for one `(source, run date, filename)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    /// `staging_root/source/YYYYMMDD`
    pub local_folder: PathBuf,
    /// `local_folder/filename`, or `local_folder` itself in multi-file mode.
    pub file_path: PathBuf,
    pub archive_key: ArchiveKey,
    /// Archive counterpart of `local_folder`.
    pub folder_key: ArchiveKey,
}

/// Everything a source hook needs to know about the current run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_date: RunDate,
    pub source_system: String,
    pub paths: RunPaths,
}

/// Which phases to run for a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunFlags {
    pub fetch: bool,
    pub load: bool,
}
