#[cfg(feature = "server")]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WhoisError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("public suffix: {0}")]
    PublicSuffix(String),

    #[error("unknown whois server")]
    UnknownWhoisServer,

    #[error("dial {server}: {source}")]
    Dial {
        server: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    IoError(#[from] tokio::io::Error),

    #[error("timeout")]
    Timeout,

    #[error("domain/ip not found")]
    NotFound,

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<tokio::time::error::Elapsed> for WhoisError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        WhoisError::Timeout
    }
}

impl WhoisError {
    /// Deadline expiry at any layer, including socket-level `TimedOut`.
    pub fn is_timeout(&self) -> bool {
        match self {
            WhoisError::Timeout => true,
            WhoisError::IoError(e) => e.kind() == std::io::ErrorKind::TimedOut,
            WhoisError::Dial { source, .. } => source.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }

    /// Collapses every deadline-class error into `Timeout`.
    pub fn normalize(self) -> Self {
        if self.is_timeout() {
            WhoisError::Timeout
        } else {
            self
        }
    }

    /// Rejected at the front-end before any pipeline runs.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, WhoisError::InvalidQuery(_) | WhoisError::PublicSuffix(_))
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WhoisError::InvalidQuery(_) | WhoisError::PublicSuffix(_) => "bad_input",
            WhoisError::UnknownWhoisServer => "unknown_whois_server",
            WhoisError::Dial { .. } => "dial_error",
            WhoisError::IoError(_) => "io_error",
            WhoisError::Timeout => "timeout",
            WhoisError::NotFound => "not_found",
            WhoisError::ParseError(_) => "parse_error",
            WhoisError::Catalog(_) | WhoisError::Xml(_) => "catalog_error",
            WhoisError::HttpError(_) => "http_error",
            WhoisError::RegexError(_) => "regex_error",
            WhoisError::ConfigError(_) => "config_error",
            WhoisError::Internal(_) => "internal",
        }
    }
}

#[cfg(feature = "server")]
impl IntoResponse for WhoisError {
    fn into_response(self) -> Response {
        let status = if self.is_bad_input() {
            StatusCode::BAD_REQUEST
        } else {
            match self {
                WhoisError::Timeout => StatusCode::REQUEST_TIMEOUT,
                WhoisError::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        };

        (status, format!("{}\n", self)).into_response()
    }
}
