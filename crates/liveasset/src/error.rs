use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Failure reported by a decode function.
///
/// Decoders only see bytes, so the error carries a message and the owning
/// [`AssetError`] adds the path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DecodeError {
    message: String,
}

impl DecodeError {
    pub fn new(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for DecodeError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for DecodeError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Errors produced while loading or reloading a live asset.
///
/// The type is cheap to clone so the latest reload failure can be handed out
/// to the render thread while the watcher keeps its own copy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: Arc<notify::Error>,
    },
}

impl AssetError {
    /// Path of the asset that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            AssetError::Io { path, .. }
            | AssetError::Decode { path, .. }
            | AssetError::Watch { path, .. } => path,
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, AssetError::Io { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, AssetError::Decode { .. })
    }
}
