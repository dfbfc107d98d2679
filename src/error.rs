use std::fmt;

use thiserror::Error;

/// The codec stages that can reject their input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeStage {
    OuterBase64,
    InnerBase64,
    HexPairs,
    FinalBase64,
    Utf8,
}

impl DecodeStage {
    pub fn number(&self) -> u8 {
        match self {
            DecodeStage::OuterBase64 => 1,
            DecodeStage::InnerBase64 => 4,
            DecodeStage::HexPairs => 6,
            DecodeStage::FinalBase64 | DecodeStage::Utf8 => 9,
        }
    }
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecodeStage::OuterBase64 => "outer base64",
            DecodeStage::InnerBase64 => "inner base64",
            DecodeStage::HexPairs => "hex pairs",
            DecodeStage::FinalBase64 => "final base64",
            DecodeStage::Utf8 => "utf-8 result",
        };
        write!(f, "stage {} ({})", self.number(), name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage}: {reason}")]
pub struct DecodeError {
    pub stage: DecodeStage,
    pub reason: String,
}

impl DecodeError {
    pub fn new(stage: DecodeStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} flagged the request as spam; the IP address is blacklisted")]
    Blacklisted { url: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{provider}: no stream source found in the embed page")]
    NotFound { provider: String },

    #[error("{provider}: stream source is malformed: {reason}")]
    Malformed { provider: String, reason: String },

    #[error("decode failed at {0}")]
    Decode(#[from] DecodeError),

    #[error("no link for hoster '{hoster}' in language '{language}'")]
    SelectionUnavailable { hoster: String, language: String },

    #[error("hoster '{0}' is not supported")]
    ProviderUnsupported(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_names_stage() {
        let err = DecodeError::new(DecodeStage::HexPairs, "odd length 5");
        assert_eq!(err.to_string(), "stage 6 (hex pairs): odd length 5");
    }

    #[test]
    fn test_pipeline_error_from_decode() {
        let err: PipelineError = DecodeError::new(DecodeStage::OuterBase64, "bad").into();
        assert!(matches!(err, PipelineError::Decode(ref e) if e.stage == DecodeStage::OuterBase64));
        assert!(err.to_string().contains("stage 1"));
    }
}
