use std::path::{Path, PathBuf};

use thiserror::Error;

/// Fatal errors. Any of these aborts the whole run.
#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("tensor error while {context}: {source}")]
    Tensor {
        context: &'static str,
        #[source]
        source: candle_core::Error,
    },
    #[error("{context}: {message}")]
    Runtime {
        context: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("malformed line {line} in '{}': {message}", path.display())]
    MalformedTable {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("transcript does not match audio entry '{utterance}': {message}")]
    TranscriptMismatch { utterance: String, message: String },
    #[error("transcript for '{utterance}' is empty")]
    EmptyTranscript { utterance: String },
    #[error("symbol '{symbol}' is not in the {table}")]
    UnknownSymbol { table: &'static str, symbol: String },
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl AlignmentError {
    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn tensor(context: &'static str, source: candle_core::Error) -> Self {
        Self::Tensor { context, source }
    }

    pub fn runtime(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Runtime {
            context,
            message: err.to_string(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn malformed(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Self::MalformedTable {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn transcript_mismatch(utterance: &str, message: impl Into<String>) -> Self {
        Self::TranscriptMismatch {
            utterance: utterance.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn unknown_symbol(table: &'static str, symbol: impl Into<String>) -> Self {
        Self::UnknownSymbol {
            table,
            symbol: symbol.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Why a single utterance produced no output. The batch carries on with the
/// next utterance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("audio is too short ({duration_secs} sec)")]
    TooShort { duration_secs: f64 },
    #[error("audio has {available} channels but channel {requested} was requested")]
    ChannelMissing { available: usize, requested: usize },
    #[error("no vtln-map entry for utterance-id (or speaker-id)")]
    MissingWarp,
    #[error("failed to compute features: {0}")]
    FeatureExtraction(String),
    #[error("failed to compute pitch: {0}")]
    PitchExtraction(String),
    #[error("length mismatch {max_frames} vs. {min_frames} exceeds tolerance {tolerance}")]
    FeatureFusion {
        max_frames: usize,
        min_frames: usize,
        tolerance: usize,
    },
    #[error("unusable feature streams: {0}")]
    MalformedFeatures(String),
    #[error("empty decoding graph")]
    EmptyGraph,
    #[error("zero-length utterance")]
    ZeroLengthFeatures,
    #[error("decoding failed: {0}")]
    DecodeFailed(String),
    #[error("decoder produced an empty alignment")]
    EmptyPath,
}

impl SkipReason {
    /// Stable key used when counting skips per reason.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TooShort { .. } => "too_short",
            Self::ChannelMissing { .. } => "channel_missing",
            Self::MissingWarp => "missing_warp",
            Self::FeatureExtraction(_) => "feature_extraction",
            Self::PitchExtraction(_) => "pitch_extraction",
            Self::FeatureFusion { .. } => "feature_fusion",
            Self::MalformedFeatures(_) => "malformed_features",
            Self::EmptyGraph => "empty_graph",
            Self::ZeroLengthFeatures => "zero_length_features",
            Self::DecodeFailed(_) => "decode_failed",
            Self::EmptyPath => "empty_path",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fusion_skip_reports_both_lengths() {
        let reason = SkipReason::FeatureFusion {
            max_frames: 105,
            min_frames: 100,
            tolerance: 2,
        };
        assert_eq!(
            reason.to_string(),
            "length mismatch 105 vs. 100 exceeds tolerance 2"
        );
        assert_eq!(reason.kind(), "feature_fusion");
    }

    #[test]
    fn malformed_table_names_path_and_line() {
        let err = AlignmentError::malformed(Path::new("words.txt"), 3, "expected 2 fields, got 3");
        assert_eq!(
            err.to_string(),
            "malformed line 3 in 'words.txt': expected 2 fields, got 3"
        );
    }
}
