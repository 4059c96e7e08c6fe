use thiserror::Error;

/// Rejections raised before any catalog state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("question id must not be empty")]
    MissingId,

    #[error("category name must not be empty")]
    MissingCategoryName,
}
