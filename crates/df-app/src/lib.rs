//! Shared application service layer for ductflow.
//!
//! Centralizes what the CLI (and any other frontend) needs: loading and
//! validating design documents, compiling them into engine inputs, running
//! the route/size/balance pipeline and exporting the result.

pub mod design_compile;
pub mod design_service;
pub mod error;
pub mod export;
pub mod progress;
pub mod project_service;

pub use design_compile::{DesignInputs, compile_design};
pub use design_service::{
    DesignOutcome, LevelSummary, route_design_levels, run_design, run_design_with_progress,
};
pub use error::{AppError, AppResult};
pub use export::{MemoryWriter, NodeLinkDocument, ScopedWriter, SharedFileWriter, export_node_link, node_link_document};
pub use progress::{DesignProgressEvent, DesignStage};
pub use project_service::{design_issues, load_design, validate_design};
