use std::{fmt, path::PathBuf};

/// Output file produced by one of the export stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Chart,
    Workbook,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Chart => f.write_str("chart"),
            Artifact::Workbook => f.write_str("workbook"),
        }
    }
}

/// Failure of a best-effort export. The variant is picked where the failure
/// happens, so callers never have to look at the message text.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("{artifact} skipped: the `{dependency}` backend is not available in this build")]
    DependencyMissing {
        artifact: Artifact,
        dependency: &'static str,
    },

    #[error("failed to render {artifact}: {reason}")]
    RenderFailure { artifact: Artifact, reason: String },

    #[error("failed to write {artifact} to {}: {source}", path.display())]
    IoFailure {
        artifact: Artifact,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn artifact(&self) -> Artifact {
        match self {
            ExportError::DependencyMissing { artifact, .. }
            | ExportError::RenderFailure { artifact, .. }
            | ExportError::IoFailure { artifact, .. } => *artifact,
        }
    }

    pub fn is_dependency_missing(&self) -> bool {
        matches!(self, ExportError::DependencyMissing { .. })
    }
}
