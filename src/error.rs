use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignError {
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
    #[error("invalid audio: {message}")]
    InvalidAudio { message: String },
    #[error("invalid configuration: {message}")]
    Configuration { message: String },
    #[error("empty feature sequence: {message}")]
    EmptySequence { message: String },
    #[error("no valid alignment path: {message}")]
    NoValidPath { message: String },
}

impl AlignError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn invalid_audio(message: impl Into<String>) -> Self {
        Self::InvalidAudio {
            message: message.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn empty_sequence(message: impl Into<String>) -> Self {
        Self::EmptySequence {
            message: message.into(),
        }
    }

    pub(crate) fn no_valid_path(message: impl Into<String>) -> Self {
        Self::NoValidPath {
            message: message.into(),
        }
    }
}
