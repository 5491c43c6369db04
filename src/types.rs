use serde::{de::DeserializeOwned, Serialize, Serializer};

use crate::{CascadeError, Payload, Result};

/// `source` value of a result in which no endpoint succeeded.
pub const NO_SOURCE: &str = "none";

/// `error` value of a result in which no endpoint succeeded.
pub const EXHAUSTED_ERROR: &str = "All fallbacks failed";

/// Outcome of one `resolve` call.
///
/// `data` is present exactly when `fallback_index` is `Some` and `source`
/// is not [`NO_SOURCE`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeResult {
    pub data: Option<Payload>,
    pub source: String,
    pub endpoint_used: String,
    #[serde(serialize_with = "serialize_fallback_index")]
    pub fallback_index: Option<usize>,
    pub latency_ms: u64,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CascadeResult {
    pub(crate) fn success(
        data: Payload,
        source: String,
        endpoint_used: String,
        fallback_index: usize,
        latency_ms: u64,
        status_code: u16,
    ) -> Self {
        Self {
            data: Some(data),
            source,
            endpoint_used,
            fallback_index: Some(fallback_index),
            latency_ms,
            status_code,
            error: None,
        }
    }

    pub(crate) fn exhausted(latency_ms: u64, status_code: u16) -> Self {
        Self {
            data: None,
            source: NO_SOURCE.to_owned(),
            endpoint_used: String::new(),
            fallback_index: None,
            latency_ms,
            status_code,
            error: Some(EXHAUSTED_ERROR.to_owned()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.data.is_some()
    }

    /// True when a source other than the primary supplied the data.
    pub fn used_fallback(&self) -> bool {
        self.fallback_index.is_some_and(|index| index > 0)
    }

    /// Fallback index using `-1` for "no endpoint succeeded".
    pub fn fallback_index_signed(&self) -> i64 {
        self.fallback_index
            .map_or(-1, |index| i64::try_from(index).unwrap_or(i64::MAX))
    }

    /// Decodes the winning payload into a collaborator-defined type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let data = self.data.as_ref().ok_or_else(|| {
            CascadeError::Decode(format!(
                "no payload to decode: {}",
                self.error.as_deref().unwrap_or(EXHAUSTED_ERROR)
            ))
        })?;
        data.decode()
    }
}

fn serialize_fallback_index<S: Serializer>(
    index: &Option<usize>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match index {
        Some(index) => serializer.serialize_u64(*index as u64),
        None => serializer.serialize_i64(-1),
    }
}
