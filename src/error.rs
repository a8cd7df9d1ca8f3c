use std::path::PathBuf;

/// Fatal failures of a conversion run. Any of these aborts the whole run
/// before the output file is touched.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("source unavailable: {reference}: {reason}")]
    SourceUnavailable { reference: String, reason: String },

    #[error("malformed input in {reference}: {source}")]
    MalformedInput {
        reference: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not write {}: {source}", path.display())]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub fn unavailable(reference: &str, reason: impl ToString) -> Self {
        ConvertError::SourceUnavailable {
            reference: reference.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            ConvertError::MalformedInput { .. } => 2,
            ConvertError::SourceUnavailable { .. } | ConvertError::OutputWriteFailure { .. } => 1,
        }
    }
}
