//! Error types for cards, proxies and the store client

use thiserror::Error;

/// Result type alias for zhaomu operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, rendering or delivering a card
#[derive(Error, Debug)]
pub enum Error {
    /// Raster surface could not be created or encoded
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Scannable code could not be generated
    #[error("Code generation failed: {0}")]
    CodeError(String),

    /// A required API key or endpoint is not configured
    #[error("Missing configuration: {0}")]
    MissingKey(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Upstream service answered with an error
    #[error("Upstream error: {0}")]
    UpstreamError(String),

    /// Upstream payload could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Upstream answered successfully but had nothing to offer
    #[error("No data: {0}")]
    NoData(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Hosted table rejected the request
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Caller supplied unusable input (empty title, bad date range, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Capability (clipboard, share) is not available on this host
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable short code, used in JSON output of the proxy commands.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::RenderError(_) => "render_error",
            Self::CodeError(_) => "code_error",
            Self::MissingKey(_) => "missing_key",
            Self::ConfigError(_) => "config_error",
            Self::UpstreamError(_) => "upstream_error",
            Self::ParseError(_) => "parse_error",
            Self::NoData(_) => "no_data",
            Self::Timeout(_) => "timeout",
            Self::NetworkError(_) => "network_error",
            Self::BackendError(_) => "backend_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::Unsupported(_) => "unsupported",
            Self::Io(_) => "io_error",
            Self::Other(_) => "exception",
        }
    }

    /// Short message suitable for showing next to the action that failed.
    pub fn user_message(&self) -> String {
        match self {
            Self::RenderError(_) => "生成失败".to_string(),
            Self::CodeError(_) => "二维码生成失败，图片中已省略二维码".to_string(),
            Self::MissingKey(what) => format!("{what} 未配置"),
            Self::Timeout(_) => "请求超时，请稍后再试".to_string(),
            Self::NetworkError(_) => "网络错误，请稍后再试".to_string(),
            Self::NoData(msg) if !msg.is_empty() => msg.clone(),
            Self::Unsupported(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ParseError(err.to_string())
    }
}
