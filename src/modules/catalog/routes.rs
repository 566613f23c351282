use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use libris_http::error::AppError;
use serde::Deserialize;

use super::models::{Book, BorrowedBook, CatalogSummary, DueStatus, LoanView};
use super::SharedCatalog;

/// Catalog routes, mounted under `/api/catalog`
pub fn router(catalog: SharedCatalog) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/books", get(list_books))
        .route("/books/{id}/borrow", post(borrow_book))
        .route("/books/{id}/return", post(return_book))
        .route("/search", get(search_books))
        .route("/categories", get(list_categories))
        .route("/borrowed", get(list_borrowed))
        .route("/loans", get(list_loans))
        .route("/due", get(due_status))
        .route("/summary", get(summary))
        .with_state(catalog)
}

/// Longest search text accepted, in characters.
const MAX_QUERY_CHARS: usize = 200;

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    category: Option<String>,
}

async fn health_check() -> &'static str {
    "catalog module is healthy"
}

async fn list_books(State(catalog): State<SharedCatalog>) -> Json<Vec<Book>> {
    Json(catalog.lock().await.list_books().to_vec())
}

async fn search_books(
    State(catalog): State<SharedCatalog>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Book>>, AppError> {
    if params.q.chars().count() > MAX_QUERY_CHARS {
        return Err(AppError::bad_request(format!(
            "search text must be at most {} characters",
            MAX_QUERY_CHARS
        ))
        .with_code("query_too_long"));
    }

    let catalog = catalog.lock().await;
    Ok(Json(catalog.search(&params.q, params.category.as_deref())))
}

async fn list_categories(State(catalog): State<SharedCatalog>) -> Json<Vec<String>> {
    Json(catalog.lock().await.categories())
}

async fn borrow_book(
    State(catalog): State<SharedCatalog>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    catalog.lock().await.borrow(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn return_book(
    State(catalog): State<SharedCatalog>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    catalog.lock().await.return_book(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_borrowed(State(catalog): State<SharedCatalog>) -> Json<Vec<BorrowedBook>> {
    Json(catalog.lock().await.list_borrowed().to_vec())
}

/// Loans sorted for display: overdue, due soon, then the rest
async fn list_loans(State(catalog): State<SharedCatalog>) -> Json<Vec<LoanView>> {
    Json(catalog.lock().await.loans_by_urgency())
}

async fn due_status(State(catalog): State<SharedCatalog>) -> Json<DueStatus> {
    Json(catalog.lock().await.due_status())
}

async fn summary(State(catalog): State<SharedCatalog>) -> Json<CatalogSummary> {
    Json(catalog.lock().await.summary())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::store::CatalogStore;
    use axum::{body::Body, http::Request, response::Response};
    use libris_storage::{KvStore, MemoryStore};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    fn seeded_router() -> Router {
        let storage: Box<dyn KvStore> = Box::new(MemoryStore::new());
        let mut store = CatalogStore::with_defaults(storage).unwrap();
        store.initialize().unwrap();
        router(Arc::new(Mutex::new(store)))
    }

    async fn send(router: &Router, method: &str, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        router.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_books() {
        let router = seeded_router();
        let response = send(&router, "GET", "/books").await;
        assert_eq!(response.status(), StatusCode::OK);

        let books = body_json(response).await;
        assert_eq!(books.as_array().unwrap().len(), 8);
        assert_eq!(books[0]["coverImage"].as_str().map(|s| s.is_empty()), Some(false));
    }

    #[tokio::test]
    async fn test_search_with_category() {
        let router = seeded_router();

        let response = send(&router, "GET", "/search?q=DUNE&category=All").await;
        let found = body_json(response).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["title"], "Dune");

        let response = send(&router, "GET", "/search?category=Dystopian").await;
        let found = body_json(response).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["title"], "1984");
    }

    #[tokio::test]
    async fn test_search_rejects_overlong_query() {
        let router = seeded_router();

        let uri = format!("/search?q={}", "a".repeat(MAX_QUERY_CHARS + 1));
        let response = send(&router, "GET", &uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "query_too_long");

        let uri = format!("/search?q={}", "a".repeat(MAX_QUERY_CHARS));
        let response = send(&router, "GET", &uri).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_categories() {
        let router = seeded_router();
        let categories = body_json(send(&router, "GET", "/categories").await).await;
        assert_eq!(categories[0], "All");
        assert_eq!(categories.as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_borrow_and_return_flow() {
        let router = seeded_router();

        let response = send(&router, "POST", "/books/6/borrow").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let borrowed = body_json(send(&router, "GET", "/borrowed").await).await;
        assert_eq!(borrowed.as_array().unwrap().len(), 1);
        assert_eq!(borrowed[0]["id"], "6");
        assert!(borrowed[0]["dueDate"].is_string());

        let loans = body_json(send(&router, "GET", "/loans").await).await;
        assert_eq!(loans[0]["urgency"], "onTime");
        assert_eq!(loans[0]["daysRemaining"], 14);

        let response = send(&router, "POST", "/books/6/borrow").await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"]["code"], "book_unavailable");

        let response = send(&router, "POST", "/books/6/return").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let summary = body_json(send(&router, "GET", "/summary").await).await;
        assert_eq!(summary["borrowed"], 0);
        assert_eq!(summary["limit"], 3);
    }

    #[tokio::test]
    async fn test_borrow_limit_response() {
        let router = seeded_router();
        for id in ["1", "2", "3"] {
            let response = send(&router, "POST", &format!("/books/{}/borrow", id)).await;
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }

        let response = send(&router, "POST", "/books/4/borrow").await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "borrow_limit_exceeded");
        assert_eq!(body["error"]["details"][0]["limit"], 3);
    }

    #[tokio::test]
    async fn test_return_not_borrowed() {
        let router = seeded_router();
        let response = send(&router, "POST", "/books/nonexistent/return").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "not_borrowed");
    }

    #[tokio::test]
    async fn test_due_status_empty() {
        let router = seeded_router();
        let status = body_json(send(&router, "GET", "/due").await).await;
        assert!(status["overdue"].as_array().unwrap().is_empty());
        assert!(status["dueSoon"].as_array().unwrap().is_empty());
    }
}
