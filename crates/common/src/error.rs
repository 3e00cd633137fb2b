//! Error types shared across Wallcast crates.

use std::path::PathBuf;

/// Top-level error type for Wallcast operations.
#[derive(Debug, thiserror::Error)]
pub enum WallcastError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Layout error: {message}")]
    Layout { message: String },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Graph error: {message}")]
    Graph { message: String },

    #[error("Supervision error: {message}")]
    Supervision { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using WallcastError.
pub type WallcastResult<T> = Result<T, WallcastError>;

impl WallcastError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout {
            message: msg.into(),
        }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph {
            message: msg.into(),
        }
    }

    pub fn supervision(msg: impl Into<String>) -> Self {
        Self::Supervision {
            message: msg.into(),
        }
    }

    /// Whether this error must terminate the whole run.
    ///
    /// Probe failures abort a single source's pipeline; configuration and
    /// layout problems abort the run itself.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::Layout { .. } | Self::FileNotFound { .. }
        )
    }
}
