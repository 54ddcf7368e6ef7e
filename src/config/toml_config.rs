use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings shared by every run, built once at startup and passed by
/// reference to the processor and its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Local staging root (`<root>/<source>/<YYYYMMDD>`).
    pub staging_root: PathBuf,
    /// When false, fetch is skipped and loads use what is already archived.
    #[serde(default = "default_true")]
    pub fetch_data_from_source: bool,
    pub archive: ArchiveConfig,
    pub database: DatabaseConfig,
    pub sftp: Option<SftpConfig>,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveBackend {
    #[default]
    S3,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub backend: ArchiveBackend,
    /// `bucket`, `bucket/prefix` or `s3://bucket/prefix`.
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
    /// Directory standing in for the object store when `backend = "local"`.
    pub local_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SftpConfig {
    pub host: String,
    #[serde(default = "default_sftp_port")]
    pub port: u16,
    pub user: String,
    /// Prepended verbatim to every remote file identifier.
    #[serde(default)]
    pub remote_root: String,
    pub private_key_path: Option<PathBuf>,
    pub password: Option<String>,
    #[serde(default = "default_sftp_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourcesConfig {
    pub hitwise: Option<HitwiseConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitwiseConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub track_completeness: bool,
}

fn default_true() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_sftp_port() -> u16 {
    22
}

fn default_sftp_timeout() -> u64 {
    60
}

impl EtlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for EtlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("staging_root", &self.staging_root.to_string_lossy())?;
        validation::validate_bucket_root("archive.bucket", &self.archive.bucket)?;

        if self.archive.backend == ArchiveBackend::Local {
            let root = validation::validate_required_field(
                "archive.local_root",
                &self.archive.local_root,
            )?;
            validation::validate_path("archive.local_root", &root.to_string_lossy())?;
        }
        if let Some(endpoint) = &self.archive.endpoint {
            validation::validate_url("archive.endpoint", endpoint)?;
        }

        validation::validate_non_empty_string("database.url", &self.database.url)?;
        validation::validate_range(
            "database.connect_timeout_seconds",
            self.database.connect_timeout_seconds,
            1,
            3600,
        )?;

        if let Some(sftp) = &self.sftp {
            validation::validate_non_empty_string("sftp.host", &sftp.host)?;
            validation::validate_non_empty_string("sftp.user", &sftp.user)?;
            validation::validate_range("sftp.port", sftp.port, 1, u16::MAX)?;
            validation::validate_range("sftp.timeout_seconds", sftp.timeout_seconds, 1, 3600)?;
        }

        if let Some(hitwise) = &self.sources.hitwise {
            validation::validate_url("sources.hitwise.url", &hitwise.url)?;
            validation::validate_non_empty_string("sources.hitwise.username", &hitwise.username)?;
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}
