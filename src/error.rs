/// Error type returned by the fallible edges of this crate.
///
/// Failures of individual endpoint attempts never surface here; `resolve`
/// absorbs them and reports exhaustion through [`crate::CascadeResult`].
#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    /// Invalid configuration value, e.g. an unparseable environment variable.
    #[error("config error: {0}")]
    Config(String),
    /// Endpoint address with no derivable host.
    #[error("invalid endpoint address '{address}'")]
    InvalidEndpoint {
        /// The address as supplied by the caller.
        address: String,
    },
    /// Payload could not be decoded into the requested type.
    #[error("decode error: {0}")]
    Decode(String),
    /// The underlying HTTP client could not be constructed.
    #[error("client build error: {0}")]
    Client(reqwest::Error),
}
