//! Library catalog: the book collection, active loans, and the rules
//! for borrowing and returning.

pub mod error;
pub mod models;
pub mod routes;
pub mod seed;
pub mod store;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use libris_kernel::{settings::Settings, InitCtx, Module};
use libris_storage::KvStore;
use tokio::sync::Mutex;

pub use error::CatalogError;
pub use models::{Book, BorrowedBook, CatalogSummary, DueStatus, LoanUrgency, LoanView};
pub use store::{CatalogStore, LendingPolicy, StorageKeys};

/// Store shared between request handlers; one operation runs at a time.
pub type SharedCatalog = Arc<Mutex<CatalogStore<Box<dyn KvStore>>>>;

/// Open the configured storage backend and load the catalog from it.
pub fn open_catalog(settings: &Settings) -> anyhow::Result<CatalogStore<Box<dyn KvStore>>> {
    let policy = LendingPolicy::try_from(&settings.lending)
        .with_context(|| "invalid [lending] configuration")?;

    let storage = libris_storage::open_store(&settings.storage)
        .with_context(|| "failed to open catalog storage")?;

    CatalogStore::open(storage, StorageKeys::from(&settings.storage), policy)
        .with_context(|| "failed to load catalog")
}

/// Catalog module: seeds storage on init and serves the catalog routes
pub struct CatalogModule {
    catalog: SharedCatalog,
}

impl CatalogModule {
    pub fn new(catalog: SharedCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let mut catalog = self.catalog.lock().await;
        catalog
            .initialize()
            .with_context(|| "failed to seed catalog")?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = catalog.list_books().len(),
            borrowed = catalog.list_borrowed().len(),
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.catalog.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let summary = self.catalog.lock().await.summary();
        if summary.alerts() > 0 {
            tracing::warn!(
                overdue = summary.overdue,
                due_soon = summary.due_soon,
                "loans need attention"
            );
        }
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module stopped");
        Ok(())
    }
}

/// Create a new instance of the catalog module
pub fn create_module(catalog: SharedCatalog) -> Arc<dyn Module> {
    Arc::new(CatalogModule::new(catalog))
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn error_response(description: &str) -> serde_json::Value {
    json_response(
        description,
        serde_json::json!({ "$ref": "#/components/schemas/ErrorResponse" }),
    )
}

fn array_of(schema: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "array",
        "items": { "$ref": format!("#/components/schemas/{}", schema) }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_param = serde_json::json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    }]);

    serde_json::json!({
        "paths": {
            "/books": {
                "get": {
                    "summary": "List the catalog",
                    "tags": ["Catalog"],
                    "responses": { "200": json_response("Every book in stored order", array_of("Book")) }
                }
            },
            "/search": {
                "get": {
                    "summary": "Search by title or author, optionally within a category",
                    "tags": ["Catalog"],
                    "parameters": [
                        { "name": "q", "in": "query", "schema": { "type": "string" } },
                        { "name": "category", "in": "query", "schema": { "type": "string" } }
                    ],
                    "responses": {
                        "200": json_response("Matching books", array_of("Book")),
                        "400": error_response("Search text too long")
                    }
                }
            },
            "/categories": {
                "get": {
                    "summary": "Distinct categories, \"All\" first",
                    "tags": ["Catalog"],
                    "responses": {
                        "200": json_response("Categories", serde_json::json!({ "type": "array", "items": { "type": "string" } }))
                    }
                }
            },
            "/books/{id}/borrow": {
                "post": {
                    "summary": "Borrow a book",
                    "tags": ["Loans"],
                    "parameters": id_param.clone(),
                    "responses": {
                        "204": { "description": "Borrowed" },
                        "409": error_response("Loan limit reached or book unavailable")
                    }
                }
            },
            "/books/{id}/return": {
                "post": {
                    "summary": "Return a borrowed book",
                    "tags": ["Loans"],
                    "parameters": id_param,
                    "responses": {
                        "204": { "description": "Returned" },
                        "404": error_response("Book is not borrowed")
                    }
                }
            },
            "/borrowed": {
                "get": {
                    "summary": "Active loans in borrow order",
                    "tags": ["Loans"],
                    "responses": { "200": json_response("Active loans", array_of("BorrowedBook")) }
                }
            },
            "/loans": {
                "get": {
                    "summary": "Active loans ordered by urgency",
                    "tags": ["Loans"],
                    "responses": { "200": json_response("Loans with urgency", array_of("LoanView")) }
                }
            },
            "/due": {
                "get": {
                    "summary": "Overdue and due-soon loans",
                    "tags": ["Loans"],
                    "responses": { "200": json_response("Due status", serde_json::json!({ "$ref": "#/components/schemas/DueStatus" })) }
                }
            },
            "/summary": {
                "get": {
                    "summary": "Loan counts and alerts",
                    "tags": ["Loans"],
                    "responses": { "200": json_response("Summary", serde_json::json!({ "$ref": "#/components/schemas/CatalogSummary" })) }
                }
            },
            "/health": {
                "get": {
                    "summary": "Catalog health check",
                    "tags": ["Catalog"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "Unique identifier for the book" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "category": { "type": "string" },
                        "coverImage": { "type": "string", "format": "uri" },
                        "description": { "type": "string" },
                        "available": { "type": "boolean", "description": "False while the book is on loan" }
                    },
                    "required": ["id", "title", "author", "category", "coverImage", "description", "available"]
                },
                "BorrowedBook": {
                    "allOf": [
                        { "$ref": "#/components/schemas/Book" },
                        {
                            "type": "object",
                            "properties": {
                                "borrowDate": { "type": "string", "format": "date-time" },
                                "dueDate": { "type": "string", "format": "date-time" }
                            },
                            "required": ["borrowDate", "dueDate"]
                        }
                    ]
                },
                "LoanView": {
                    "allOf": [
                        { "$ref": "#/components/schemas/BorrowedBook" },
                        {
                            "type": "object",
                            "properties": {
                                "urgency": { "type": "string", "enum": ["overdue", "dueSoon", "onTime"] },
                                "daysRemaining": { "type": "integer" }
                            },
                            "required": ["urgency", "daysRemaining"]
                        }
                    ]
                },
                "DueStatus": {
                    "type": "object",
                    "properties": {
                        "overdue": array_of("BorrowedBook"),
                        "dueSoon": array_of("BorrowedBook")
                    },
                    "required": ["overdue", "dueSoon"]
                },
                "CatalogSummary": {
                    "type": "object",
                    "properties": {
                        "borrowed": { "type": "integer" },
                        "limit": { "type": "integer" },
                        "overdue": { "type": "integer" },
                        "dueSoon": { "type": "integer" }
                    },
                    "required": ["borrowed", "limit", "overdue", "dueSoon"]
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_kernel::settings::StorageBackend;
    use tempfile::TempDir;

    fn memory_settings() -> Settings {
        let mut settings = Settings::default();
        settings.storage.backend = StorageBackend::Memory;
        settings
    }

    #[tokio::test]
    async fn test_module_init_seeds_catalog() {
        let settings = memory_settings();
        let catalog: SharedCatalog = Arc::new(Mutex::new(open_catalog(&settings).unwrap()));
        let module = CatalogModule::new(catalog.clone());

        let ctx = InitCtx {
            settings: &settings,
        };
        module.init(&ctx).await.unwrap();
        module.start(&ctx).await.unwrap();

        assert_eq!(catalog.lock().await.list_books().len(), 8);
    }

    #[test]
    fn test_file_backed_catalog_survives_restart() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.storage.backend = StorageBackend::File;
        settings.storage.path = dir.path().join("library.json");

        let mut first = open_catalog(&settings).unwrap();
        first.initialize().unwrap();
        first.borrow("8").unwrap();
        drop(first);

        let second = open_catalog(&settings).unwrap();
        assert_eq!(second.list_borrowed().len(), 1);
        assert_eq!(second.list_borrowed()[0].id(), "8");
        assert!(!second.get_book("8").unwrap().available);
    }

    #[test]
    fn test_open_catalog_rejects_invalid_lending_rules() {
        let mut settings = memory_settings();
        settings.lending.loan_period_days = 10_000_000;
        assert!(open_catalog(&settings).is_err());

        settings.lending.loan_period_days = 14;
        settings.lending.max_loans = 0;
        assert!(open_catalog(&settings).is_err());
    }

    #[test]
    fn test_openapi_fragment_lists_every_route() {
        let spec = openapi_fragment();
        for path in [
            "/books",
            "/search",
            "/categories",
            "/books/{id}/borrow",
            "/books/{id}/return",
            "/borrowed",
            "/loans",
            "/due",
            "/summary",
            "/health",
        ] {
            assert!(spec["paths"][path].is_object(), "missing {}", path);
        }
    }
}
