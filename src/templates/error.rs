//! Template engine error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    /// No embedded template with this name
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Embedded file is not valid UTF-8
    #[error("Invalid template encoding: {0}")]
    InvalidEncoding(String),

    #[error("Template error: {0}")]
    RenderError(String),
}
