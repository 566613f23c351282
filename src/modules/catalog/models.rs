use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique, stable identifier
    pub id: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub cover_image: String,
    pub description: String,
    /// False while a loan for this id exists
    pub available: bool,
}

/// An active loan: a copy of the catalog entry taken at borrow time plus loan dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBook {
    #[serde(flatten)]
    pub book: Book,
    #[serde(with = "time::serde::rfc3339")]
    pub borrow_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
}

impl BorrowedBook {
    pub fn id(&self) -> &str {
        &self.book.id
    }
}

/// Loans needing attention, derived from due dates only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueStatus {
    /// Due date strictly before now
    pub overdue: Vec<BorrowedBook>,
    /// Due date at or after now and within the due-soon window
    pub due_soon: Vec<BorrowedBook>,
}

/// Urgency bucket of a single loan. Variant order is display priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoanUrgency {
    Overdue,
    DueSoon,
    OnTime,
}

/// A loan annotated for display in the borrowed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanView {
    #[serde(flatten)]
    pub loan: BorrowedBook,
    pub urgency: LoanUrgency,
    /// Whole days until due, rounded up; negative once overdue
    pub days_remaining: i64,
}

/// Counts backing the "n / limit borrowed" header and the alert badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub borrowed: usize,
    pub limit: usize,
    pub overdue: usize,
    pub due_soon: usize,
}

impl CatalogSummary {
    pub fn alerts(&self) -> usize {
        self.overdue + self.due_soon
    }
}
