//! Error types for the Falcon API clients.

use thiserror::Error;

#[cfg(test)]
mod tests;

/// Client error types.
///
/// Every failure path in the library surfaces exactly one of these values;
/// nothing is retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// The API id and key were not both provided.
    #[error("missing credentials: you must provide the API id and key")]
    MissingCredentials,

    /// A request was missing parameters the endpoint requires.
    #[error("missing parameters: you must provide the required parameters for the request")]
    MissingParameters,

    /// The configured base URL does not use the http or https scheme.
    #[error("invalid URL scheme [{0}]")]
    BadUrl(String),

    /// The API returned a status code outside 200-299.
    #[error("unexpected status code: {status} ({reason})")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Canonical reason text for the status.
        reason: String,
    },

    /// HTTP request failed before a response was classified.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not match the expected JSON shape.
    #[error("JSON decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL could not be parsed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Writing the raw response body to the caller's sink failed.
    #[error("failed to write response body: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::MissingParameters => "missing_parameters",
            Self::BadUrl(_) | Self::Url(_) => "bad_url",
            Self::Api { .. } => "http_error",
            Self::Http(_) => "network_error",
            Self::Decode(_) => "decode_error",
            Self::Io(_) => "io_error",
        }
    }
}
