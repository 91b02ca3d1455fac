#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to load document {source_ref}: {reason}")]
    LoadFailure { source_ref: String, reason: String },
    #[error("failed to render page {page}: {reason}")]
    RenderFailure { page: u32, reason: String },
    #[error("no document is open")]
    NoDocument,
}
