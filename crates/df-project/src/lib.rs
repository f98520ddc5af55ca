//! df-project: design document format and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, collect_issues, validate_design};

use std::path::Path;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &Path) -> ProjectResult<Design> {
    let content = std::fs::read_to_string(path)?;
    let design: Design = serde_yaml::from_str(&content)?;
    validate_design(&design)?;
    Ok(design)
}

pub fn save_yaml(path: &Path, design: &Design) -> ProjectResult<()> {
    validate_design(design)?;
    let content = serde_yaml::to_string(design)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<Design> {
    let content = std::fs::read_to_string(path)?;
    let design: Design = serde_json::from_str(&content)?;
    validate_design(&design)?;
    Ok(design)
}

pub fn save_json(path: &Path, design: &Design) -> ProjectResult<()> {
    validate_design(design)?;
    let content = serde_json::to_string_pretty(design)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by extension: `.json` as JSON, anything else as YAML.
pub fn load_design(path: &Path) -> ProjectResult<Design> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json(path),
        _ => load_yaml(path),
    }
}
