use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Unsupported rotation: {0} degrees")]
    UnsupportedRotation(u32),
    #[error("Split ratio out of range: {0}")]
    InvalidRatio(f64),
    #[error("Layout file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse RON layout: {0}")]
    RonParse(#[from] ron::error::SpannedError),
    #[error("Could not write RON layout: {0}")]
    RonWrite(#[from] ron::Error),
    #[error("JSON layout error: {0}")]
    Json(#[from] serde_json::Error),
}
