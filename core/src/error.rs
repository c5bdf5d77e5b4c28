//! Error types for the WMS resource client.
//!
//! # Design
//! Fetch failures are reported, not returned: every failure detected during a
//! call becomes a `WmsError` entry in the resource type's `ErrorLog`, and the
//! call itself hands back an empty result. The `Display` text of each variant
//! is the message callers see, so those strings are part of the contract.

use std::fmt;

use thiserror::Error;

/// A single failure recorded while fetching resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WmsError {
    /// Network, connection, timeout or URL failure raised by the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body was not valid JSON. Carries the parser's message.
    #[error("{0}")]
    Json(String),

    /// The service answered with a status other than 200.
    #[error("ExternalServiceError: Response code {0}")]
    ResponseCode(u16),

    #[error("ExternalServiceError: Empty body response")]
    EmptyBody,

    /// The envelope `status` was not `"success"`. Carries the envelope `message`.
    #[error("ExternalServiceError: {0}")]
    ServiceFailure(String),

    #[error("ExternalServiceError: Malformed WMS response object. Can not find :data key")]
    MissingData,

    #[error("ExternalServiceError: Malformed WMS response object. Can not find :result_list key")]
    MissingResultList,

    #[error("ExternalServiceError: Malformed WMS response object. :result_list is not an array")]
    ResultListNotArray,

    /// An entry of `result_list` at the given index is not a JSON object.
    #[error("ExternalServiceError: Malformed WMS response object. :result_list entry {0} is not an object")]
    RecordNotObject(usize),

    /// A message appended by the caller.
    #[error("{0}")]
    Other(String),
}

/// Failure to complete the HTTP exchange at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        TransportError(err.to_string())
    }
}

/// Errors raised while building a `GlobalConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// Ordered failures recorded by the most recent fetch of one resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    entries: Vec<WmsError>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: WmsError) {
        self.entries.push(error);
    }

    /// Append a free-form message, reported verbatim.
    pub fn push_message(&mut self, message: impl Into<String>) {
        self.entries.push(WmsError::Other(message.into()));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn first(&self) -> Option<&WmsError> {
        self.entries.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WmsError> {
        self.entries.iter()
    }

    /// The log rendered as human-readable strings, in recording order.
    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

impl Extend<WmsError> for ErrorLog {
    fn extend<I: IntoIterator<Item = WmsError>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a WmsError;
    type IntoIter = std::slice::Iter<'a, WmsError>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}
