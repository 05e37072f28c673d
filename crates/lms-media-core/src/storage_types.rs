use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Upload backend types
///
/// `Http` posts multipart forms to the remote upload endpoint; `Local` writes
/// into a directory served by a static file server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadBackend {
    Http,
    Local,
}

impl FromStr for UploadBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(UploadBackend::Http),
            "local" => Ok(UploadBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for UploadBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadBackend::Http => write!(f, "http"),
            UploadBackend::Local => write!(f, "local"),
        }
    }
}
