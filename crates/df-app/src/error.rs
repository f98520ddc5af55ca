//! Error types for the df-app service layer.

use std::path::PathBuf;

/// Application error wrapping the engine crates, shared by every frontend.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read design file: {path}")]
    DesignFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Design validation failed: {0}")]
    Validation(String),

    #[error("Routing failed: {0}")]
    Route(#[from] df_route::RouteError),

    #[error("Sizing failed: {0}")]
    Sizing(#[from] df_sizing::SizingError),

    #[error("Hydraulic balancing failed: {0}")]
    Hydraulics(#[from] df_hydraulics::HydraulicError),

    #[error("Export failed: {message}")]
    Export { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for df-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Pipeline stage the error came from.
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::Project(_) | AppError::DesignFileRead { .. } | AppError::Validation(_) => {
                "project"
            }
            AppError::Route(_) => "routing",
            AppError::Sizing(_) => "sizing",
            AppError::Hydraulics(_) => "hydraulics",
            AppError::Export { .. } | AppError::Io(_) => "export",
        }
    }
}

impl From<df_project::ProjectError> for AppError {
    fn from(err: df_project::ProjectError) -> Self {
        match err {
            df_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Export {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_follows_origin() {
        let err: AppError = df_sizing::SizingError::EmptyCatalog { what: "none" }.into();
        assert_eq!(err.stage(), "sizing");
        let err: AppError = df_hydraulics::HydraulicError::HydraulicSolve {
            iterations: 50,
            residual: 1.0,
        }
        .into();
        assert_eq!(err.stage(), "hydraulics");
        assert!(err.to_string().contains("50 iterations"));
    }
}
