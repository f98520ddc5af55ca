//! Design loading and validation.

use std::path::Path;

use df_project::schema::Design;

use crate::error::{AppError, AppResult};

/// Load a design document; `.json` files are read as JSON, others as YAML.
///
/// The document is parsed but not validated; see [`validate_design`].
pub fn load_design(path: &Path) -> AppResult<Design> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::DesignFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let design = if is_json {
        serde_json::from_str(&content)
            .map_err(|e| AppError::Project(format!("Failed to parse design JSON: {}", e)))?
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Project(format!("Failed to parse design YAML: {}", e)))?
    };
    Ok(design)
}

/// Validate a design, reporting every issue at once.
pub fn validate_design(design: &Design) -> AppResult<()> {
    df_project::validate_design(design).map_err(|e| AppError::Validation(e.to_string()))
}

/// Issue messages for display; empty when the design is valid.
pub fn design_issues(design: &Design) -> Vec<String> {
    df_project::collect_issues(design)
        .iter()
        .map(ToString::to_string)
        .collect()
}
