use std::path::PathBuf;
use thiserror::Error;

/// 配置加载与校验错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("Bad command line argument: {0}")]
    BadArgument(String),
}
