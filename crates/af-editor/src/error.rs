use af_core::error::GraphError;
use thiserror::Error;

/// Failures while applying, undoing or redoing an edit.
#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("failed to capture undo snapshot: {0}")]
    Snapshot(#[from] rmp_serde::encode::Error),
    #[error("failed to restore undo snapshot: {0}")]
    Restore(#[from] rmp_serde::decode::Error),
}

/// An editor config that cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid editor config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("zoom range {min}..{max} is empty or not positive")]
    ScaleRange { min: f64, max: f64 },
    #[error("zoom step must be positive, got {0}")]
    ZoomStep(f64),
}
