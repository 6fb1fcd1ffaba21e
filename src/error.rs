use thiserror::Error;

/// Errors that can occur while rendering a chart.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RenderError {
    #[error("render root is not part of the scene")]
    DetachedRoot,

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
