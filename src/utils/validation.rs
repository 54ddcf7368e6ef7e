use crate::utils::error::{EtlError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Bucket roots look like `bucket`, `bucket/prefix` or `s3://bucket/prefix`.
pub fn validate_bucket_root(field_name: &str, root: &str) -> Result<()> {
    let trimmed = root.strip_prefix("s3://").unwrap_or(root);
    let bucket = trimmed.split('/').next().unwrap_or_default();

    if bucket.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: root.to_string(),
            reason: "Bucket name cannot be empty".to_string(),
        });
    }

    if bucket.len() < 3 || bucket.len() > 63 {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: root.to_string(),
            reason: "Bucket name must be between 3 and 63 characters".to_string(),
        });
    }

    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: root.to_string(),
            reason: "Bucket name can only contain lowercase letters, numbers, hyphens, and dots"
                .to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| EtlError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("sources.hitwise.url", "https://example.com").is_ok());
        assert!(validate_url("sources.hitwise.url", "http://example.com").is_ok());
        assert!(validate_url("sources.hitwise.url", "").is_err());
        assert!(validate_url("sources.hitwise.url", "invalid-url").is_err());
        assert!(validate_url("sources.hitwise.url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_bucket_root() {
        assert!(validate_bucket_root("archive.bucket", "etl-archive").is_ok());
        assert!(validate_bucket_root("archive.bucket", "s3://etl-archive/snapshots").is_ok());
        assert!(validate_bucket_root("archive.bucket", "s3://").is_err());
        assert!(validate_bucket_root("archive.bucket", "ab").is_err());
        assert!(validate_bucket_root("archive.bucket", "Etl_Archive").is_err());
    }

    #[test]
    fn test_validate_range_and_required() {
        assert!(validate_range("sftp.port", 22u16, 1, u16::MAX).is_ok());
        assert!(validate_range("sftp.port", 0u16, 1, u16::MAX).is_err());

        let missing: Option<String> = None;
        assert!(matches!(
            validate_required_field("sftp", &missing),
            Err(EtlError::MissingConfigError { .. })
        ));
    }
}
