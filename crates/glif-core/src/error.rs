use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("download failed: {0}")]
    Download(String),
    #[error("storage error: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("cleanup failed: {context}: {source}")]
    Cleanup {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl BridgeError {
    pub fn storage(context: impl Into<String>, source: io::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }

    pub fn cleanup(context: impl Into<String>, source: io::Error) -> Self {
        Self::Cleanup {
            context: context.into(),
            source,
        }
    }

    /// Text that may be shown to the chat user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Generation(msg) | Self::Download(msg) => msg.clone(),
            Self::Storage { .. } => "could not store the generated image".to_string(),
            Self::InvalidConfig(_) | Self::Cleanup { .. } => "internal error".to_string(),
        }
    }
}
