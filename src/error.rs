//! Error types for reqscope.

/// Result type alias for reqscope operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced to callers of [`InspectedClient`](crate::InspectedClient).
///
/// Every variant originates from building or transporting the request
/// itself. The capture machinery never fails a call: scope misses and
/// body-decoding problems degrade to dropped records or raw output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying transport failed (connect, TLS, timeout, ...).
    /// Propagated untouched; no record is collected for failed sends.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The redirect chain exceeded the configured hop limit.
    #[error("exceeded redirect limit after {hops} hops")]
    TooManyRedirects {
        /// Number of hops followed before giving up.
        hops: usize,
    },

    /// The request URL failed to parse.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header name or value given to the builder was not valid HTTP.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Serializing a JSON request body failed.
    #[error("json body serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TooManyRedirects { hops: 10 };
        assert_eq!(err.to_string(), "exceeded redirect limit after 10 hops");

        let err = Error::InvalidHeader("x\ny".to_string());
        assert!(err.to_string().contains("invalid header"));
    }

    #[test]
    fn test_url_error_conversion() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
