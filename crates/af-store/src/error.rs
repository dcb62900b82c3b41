use af_core::error::StructureError;
use thiserror::Error;

/// Failures of the persistence gate and its backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The automation failed pre-save validation. Nothing was sent.
    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error("Request to the automation backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Automation backend returned HTTP {0}")]
    Status(u16),

    #[error("Malformed response from the automation backend: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Automation `{0}` not found")]
    NotFound(String),
}

impl StoreError {
    /// Whether the request never reached, or was refused by, the backend.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status(_))
    }
}
