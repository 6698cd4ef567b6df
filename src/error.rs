use thiserror::Error;

/// The raw coordinate buffer or one of its parallel arrays does not describe
/// whole critical-point pairs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed dataset ({len} values): {reason}")]
pub struct MalformedDatasetError {
    pub len: usize,
    pub reason: &'static str,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("resource `{source_ref}` is unreachable")]
    Unreachable { source_ref: String },
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Malformed(#[from] MalformedDatasetError),
    #[error("load task did not complete")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("no points to draw")]
    EmptyPointSet,
    #[error("no dataset bounds loaded")]
    MissingDomain,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("a tokio runtime is required to schedule redraws")]
    NoRuntime,
}
