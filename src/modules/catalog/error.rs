use libris_http::error::AppError;
use libris_storage::StorageError;
use thiserror::Error;

/// Failures reported by the catalog store.
///
/// The first three are expected, user-correctable outcomes; a failed
/// operation leaves both collections as they were.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("you can only borrow up to {limit} books at a time")]
    BorrowLimitExceeded { limit: usize },

    #[error("book '{id}' is not available for borrowing")]
    BookUnavailable { id: String },

    #[error("book '{id}' is not in the borrowed list")]
    NotBorrowed { id: String },

    #[error("failed to encode collection '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CatalogError {
    /// Stable machine-readable code, shared by the HTTP and CLI adapters.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BorrowLimitExceeded { .. } => "borrow_limit_exceeded",
            Self::BookUnavailable { .. } => "book_unavailable",
            Self::NotBorrowed { .. } => "not_borrowed",
            Self::Encode { .. } | Self::Storage(_) => "internal_error",
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let code = err.code();
        match err {
            CatalogError::BorrowLimitExceeded { limit } => AppError::conflict(
                vec![serde_json::json!({ "limit": limit })],
                err.to_string(),
            )
            .with_code(code),
            CatalogError::BookUnavailable { ref id } => AppError::conflict(
                vec![serde_json::json!({ "bookId": id })],
                err.to_string(),
            )
            .with_code(code),
            CatalogError::NotBorrowed { .. } => AppError::not_found(err.to_string()).with_code(code),
            CatalogError::Encode { .. } | CatalogError::Storage(_) => {
                AppError::Internal(anyhow::Error::new(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn business_errors_map_to_client_statuses() {
        let limit: AppError = CatalogError::BorrowLimitExceeded { limit: 3 }.into();
        assert_eq!(limit.status(), StatusCode::CONFLICT);

        let unavailable: AppError = CatalogError::BookUnavailable { id: "6".into() }.into();
        assert!(matches!(
            unavailable,
            AppError::Conflict { ref code, .. } if code == "book_unavailable"
        ));

        let not_borrowed: AppError = CatalogError::NotBorrowed { id: "x".into() }.into();
        assert_eq!(not_borrowed.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_errors_are_internal() {
        let err: AppError = CatalogError::Storage(StorageError::Poisoned).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
