#![allow(dead_code)]

use async_trait::async_trait;
use fetchload_etl::adapters::LocalArchive;
use fetchload_etl::config::{
    ArchiveBackend, ArchiveConfig, DatabaseConfig, EtlConfig, SftpConfig, SourcesConfig,
};
use fetchload_etl::core::cleanup;
use fetchload_etl::domain::model::ArchiveKey;
use fetchload_etl::core::{
    ArchiveStore, Payload, RemoteConnector, RemoteSession, ReturnType, RunContext, RunDate,
    SourceProcessor, Warehouse, WarehouseSession,
};
use fetchload_etl::{EtlError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const BUCKET: &str = "etl-archive";

pub fn run_date() -> RunDate {
    RunDate::parse("2023-05-01").unwrap()
}

/// Config with staging under `root/staging` and a local archive under
/// `root/archive`.
pub fn test_config(root: &Path, fetch_enabled: bool) -> EtlConfig {
    EtlConfig {
        staging_root: root.join("staging"),
        fetch_data_from_source: fetch_enabled,
        archive: ArchiveConfig {
            backend: ArchiveBackend::Local,
            bucket: BUCKET.to_string(),
            region: None,
            endpoint: None,
            force_path_style: false,
            local_root: Some(root.join("archive")),
        },
        database: DatabaseConfig {
            url: "postgres://unused/warehouse".to_string(),
            connect_timeout_seconds: 5,
        },
        sftp: Some(SftpConfig {
            host: "sftp.example.com".to_string(),
            port: 22,
            user: "etl".to_string(),
            remote_root: "/outgoing/".to_string(),
            private_key_path: None,
            password: None,
            timeout_seconds: 5,
        }),
        sources: SourcesConfig::default(),
    }
}

// ---------------------------------------------------------------------------
// Archive double: a LocalArchive that counts transfers and remembers what the
// staging file held when it was uploaded.
// ---------------------------------------------------------------------------

pub struct RecordingArchive {
    pub inner: LocalArchive,
    pub puts: AtomicUsize,
    pub gets: AtomicUsize,
    pub uploaded: Mutex<HashMap<String, Vec<u8>>>,
}

impl RecordingArchive {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: LocalArchive::new(root.join("archive")),
            puts: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            uploaded: Mutex::new(HashMap::new()),
        }
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn uploaded(&self, key: &str) -> Option<Vec<u8>> {
        self.uploaded.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ArchiveStore for RecordingArchive {
    async fn put_file(&self, local: &Path, key: &ArchiveKey) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let staged = std::fs::read(local)?;
        self.uploaded.lock().unwrap().insert(key.to_string(), staged);
        self.inner.put_file(local, key).await
    }

    async fn get_file(&self, key: &ArchiveKey, local: &Path) -> Result<()> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_file(key, local).await
    }

    async fn put_dir(&self, local_dir: &Path, prefix: &ArchiveKey) -> Result<usize> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put_dir(local_dir, prefix).await
    }

    async fn get_dir(&self, prefix: &ArchiveKey, local_dir: &Path) -> Result<usize> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_dir(prefix, local_dir).await
    }
}

// ---------------------------------------------------------------------------
// Warehouse double: tables of string rows with transactional sessions.
// ---------------------------------------------------------------------------

type Tables = HashMap<String, Vec<Vec<String>>>;

#[derive(Default)]
struct WarehouseState {
    committed: Tables,
    executed: Vec<String>,
    commits: usize,
    sessions: usize,
    fail_copy_into: Option<String>,
}

#[derive(Clone, Default)]
pub struct MemoryWarehouse {
    state: Arc<Mutex<WarehouseState>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<Vec<Vec<String>>> {
        self.state.lock().unwrap().committed.get(name).cloned()
    }

    pub fn commits(&self) -> usize {
        self.state.lock().unwrap().commits
    }

    pub fn sessions(&self) -> usize {
        self.state.lock().unwrap().sessions
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn fail_copy_into(&self, table: Option<&str>) {
        self.state.lock().unwrap().fail_copy_into = table.map(str::to_string);
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn open_session(&self) -> Result<Box<dyn WarehouseSession>> {
        let mut state = self.state.lock().unwrap();
        state.sessions += 1;
        Ok(Box::new(MemorySession {
            shared: Arc::clone(&self.state),
            pending: state.committed.clone(),
        }))
    }
}

struct MemorySession {
    shared: Arc<Mutex<WarehouseState>>,
    pending: Tables,
}

fn table_name(rest: &str) -> String {
    rest.trim()
        .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn db_error(message: String) -> EtlError {
    EtlError::DatabaseError(sqlx::Error::Protocol(message))
}

#[async_trait]
impl WarehouseSession for MemorySession {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.shared.lock().unwrap().executed.push(sql.to_string());

        let normalized = sql.split_whitespace().collect::<Vec<_>>().join(" ");
        let lower = normalized.to_lowercase();
        if let Some(rest) = lower.strip_prefix("create table if not exists ") {
            let name = table_name(&normalized[normalized.len() - rest.len()..]);
            self.pending.entry(name).or_default();
        } else if let Some(rest) = lower.strip_prefix("truncate table ") {
            let name = table_name(&normalized[normalized.len() - rest.len()..]);
            self.pending
                .get_mut(&name)
                .ok_or_else(|| db_error(format!("relation {} does not exist", name)))?
                .clear();
        }
        Ok(())
    }

    async fn copy_csv(&mut self, table: &str, path: &Path, header: bool) -> Result<u64> {
        if self.shared.lock().unwrap().fail_copy_into.as_deref() == Some(table) {
            return Err(db_error(format!("copy into {} failed", table)));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(header)
            .flexible(true)
            .from_path(path)?;
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let target = self
            .pending
            .get_mut(table)
            .ok_or_else(|| db_error(format!("relation {} does not exist", table)))?;
        let copied = rows.len() as u64;
        target.extend(rows);
        Ok(copied)
    }

    async fn commit(&mut self) -> Result<()> {
        let mut state = self.shared.lock().unwrap();
        state.committed = self.pending.clone();
        state.commits += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Source double.
// ---------------------------------------------------------------------------

pub type TransformFn = Box<dyn Fn(&RunContext) -> Result<()> + Send + Sync>;

pub struct StubSource {
    pub system: String,
    pub filename: Option<String>,
    pub declared: ReturnType,
    pub payload: Payload,
    pub fetch_calls: Arc<AtomicUsize>,
    pub checked_calls: Arc<AtomicUsize>,
    pub fetch_error: bool,
    pub transform: Option<TransformFn>,
    /// Destination tables (created and truncated before the copy).
    pub tables: Vec<String>,
    /// `(staged file relative to the run folder, table)`
    pub copies: Vec<(String, String)>,
    /// Extra statements appended to the create/truncate DDL.
    pub schema_sql: Vec<String>,
}

impl StubSource {
    pub fn new(system: &str, filename: Option<&str>, payload: Payload) -> Self {
        Self {
            system: system.to_string(),
            filename: filename.map(str::to_string),
            declared: payload.return_type(),
            payload,
            fetch_calls: Arc::new(AtomicUsize::new(0)),
            checked_calls: Arc::new(AtomicUsize::new(0)),
            fetch_error: false,
            transform: None,
            tables: Vec::new(),
            copies: Vec::new(),
            schema_sql: Vec::new(),
        }
    }

    pub fn declared(mut self, declared: ReturnType) -> Self {
        self.declared = declared;
        self
    }

    pub fn failing_fetch(mut self) -> Self {
        self.fetch_error = true;
        self
    }

    pub fn with_transform(
        mut self,
        f: impl Fn(&RunContext) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Box::new(f));
        self
    }

    pub fn schema_statement(mut self, sql: &str) -> Self {
        self.schema_sql.push(sql.to_string());
        self
    }

    pub fn copy(mut self, file: &str, table: &str) -> Self {
        if !self.tables.iter().any(|t| t == table) {
            self.tables.push(table.to_string());
        }
        self.copies.push((file.to_string(), table.to_string()));
        self
    }
}

#[async_trait]
impl SourceProcessor for StubSource {
    fn source_system(&self) -> &str {
        &self.system
    }

    fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    fn return_type(&self) -> ReturnType {
        self.declared
    }

    async fn fetch(&self, _ctx: &RunContext) -> Result<Payload> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fetch_error {
            return Err(EtlError::IoError(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "source unavailable",
            )));
        }
        Ok(self.payload.clone())
    }

    async fn transform(&self, ctx: &RunContext) -> Result<()> {
        match &self.transform {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }

    fn check_fetched_files(&self, _ctx: &RunContext) -> Result<()> {
        self.checked_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn pre_copy_sql(&self, _ctx: &RunContext) -> Vec<String> {
        self.tables
            .iter()
            .flat_map(|table| {
                [
                    format!("create table if not exists {} (a varchar, b varchar)", table),
                    format!("truncate table {}", table),
                ]
            })
            .chain(self.schema_sql.iter().cloned())
            .collect()
    }

    async fn copy_to_db(
        &self,
        ctx: &RunContext,
        session: &mut dyn WarehouseSession,
    ) -> Result<()> {
        for (file, table) in &self.copies {
            let path = ctx.paths.local_folder.join(file);
            session.copy_csv(table, &path, false).await?;
            cleanup::remove_staged_file(&path);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Remote file server double backed by a local directory.
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct FakeRemote {
    pub root: PathBuf,
    pub open_sessions: Arc<AtomicUsize>,
    pub connects: Arc<AtomicUsize>,
    pub fail_on: Option<String>,
}

impl FakeRemote {
    /// Serves files from `root`, which stands in for the server's filesystem.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            open_sessions: Arc::new(AtomicUsize::new(0)),
            connects: Arc::new(AtomicUsize::new(0)),
            fail_on: None,
        }
    }

    pub fn add_file(&self, remote_path: &str, content: &[u8]) {
        let path = self.root.join(remote_path.trim_start_matches('/'));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

impl RemoteConnector for FakeRemote {
    fn connect(&self) -> Result<Box<dyn RemoteSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            remote: self.clone(),
        }))
    }
}

struct FakeSession {
    remote: FakeRemote,
}

impl RemoteSession for FakeSession {
    fn get_file(&mut self, remote_path: &str, local_dir: &Path) -> Result<PathBuf> {
        if self.remote.fail_on.as_deref() == Some(remote_path) {
            return Err(EtlError::SftpError {
                message: format!("transfer of {} interrupted", remote_path),
            });
        }
        let source = self.remote.root.join(remote_path.trim_start_matches('/'));
        let target = local_dir.join(source.file_name().unwrap());
        std::fs::copy(&source, &target)?;
        Ok(target)
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.remote.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Lists every file below `dir`, relative and sorted.
pub fn list_files(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}
