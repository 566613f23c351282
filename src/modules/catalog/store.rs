use std::collections::HashSet;

use libris_kernel::settings::{LendingSettings, StorageSettings};
use libris_storage::KvStore;
use serde::{de::DeserializeOwned, Serialize};
use time::{Duration, OffsetDateTime};

use super::error::CatalogError;
use super::models::{Book, BorrowedBook, CatalogSummary, DueStatus, LoanUrgency, LoanView};
use super::seed::seed_books;

/// Category value that disables category filtering.
pub const ALL_CATEGORIES: &str = "All";

const NANOS_PER_DAY: i128 = 86_400 * 1_000_000_000;

/// Storage keys holding the two collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub books: String,
    pub borrowed: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::from(&StorageSettings::default())
    }
}

impl From<&StorageSettings> for StorageKeys {
    fn from(settings: &StorageSettings) -> Self {
        Self {
            books: settings.books_key.clone(),
            borrowed: settings.borrowed_key.clone(),
        }
    }
}

/// Loan rules: global cap, loan length, and how early a loan counts as due soon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingPolicy {
    pub max_loans: usize,
    pub loan_period: Duration,
    pub due_soon_window: Duration,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self::from_checked(&LendingSettings::default())
    }
}

impl TryFrom<&LendingSettings> for LendingPolicy {
    type Error = anyhow::Error;

    fn try_from(settings: &LendingSettings) -> anyhow::Result<Self> {
        settings.validate()?;
        Ok(Self::from_checked(settings))
    }
}

impl LendingPolicy {
    // Callers must have validated `settings`; `Duration::days` panics out of range.
    fn from_checked(settings: &LendingSettings) -> Self {
        Self {
            max_loans: settings.max_loans,
            loan_period: Duration::days(settings.loan_period_days),
            due_soon_window: Duration::days(settings.due_soon_days),
        }
    }

    /// Bucket a loan by its due date relative to `now`.
    pub fn classify(&self, due_date: OffsetDateTime, now: OffsetDateTime) -> LoanUrgency {
        if due_date < now {
            LoanUrgency::Overdue
        } else if due_date - now <= self.due_soon_window {
            LoanUrgency::DueSoon
        } else {
            LoanUrgency::OnTime
        }
    }
}

/// Whole days until `due_date`, rounded up. Zero or negative once it has passed.
pub fn days_remaining(due_date: OffsetDateTime, now: OffsetDateTime) -> i64 {
    let nanos = (due_date - now).whole_nanoseconds();
    // ceil(a / b) == -floor(-a / b)
    -((-nanos).div_euclid(NANOS_PER_DAY)) as i64
}

/// Owns the catalog and borrowed collections.
///
/// Both collections are loaded from the key-value store once, served from
/// memory, and written back after every successful mutation.
pub struct CatalogStore<S> {
    storage: S,
    keys: StorageKeys,
    policy: LendingPolicy,
    books: Vec<Book>,
    borrowed: Vec<BorrowedBook>,
}

impl<S: KvStore> CatalogStore<S> {
    /// Load both collections. Absent or unreadable values load as empty.
    pub fn open(storage: S, keys: StorageKeys, policy: LendingPolicy) -> Result<Self, CatalogError> {
        let books = read_collection(&storage, &keys.books)?;
        let borrowed = read_collection(&storage, &keys.borrowed)?;

        tracing::debug!(
            books = books.len(),
            borrowed = borrowed.len(),
            "catalog loaded"
        );

        Ok(Self {
            storage,
            keys,
            policy,
            books,
            borrowed,
        })
    }

    /// Open with default keys and lending rules.
    pub fn with_defaults(storage: S) -> Result<Self, CatalogError> {
        Self::open(storage, StorageKeys::default(), LendingPolicy::default())
    }

    /// Write the seed catalog and an empty borrowed list for whichever key is
    /// not yet present. Existing values are left alone.
    pub fn initialize(&mut self) -> Result<(), CatalogError> {
        if self.storage.get(&self.keys.books)?.is_none() {
            let seed = seed_books();
            write_collection(&self.storage, &self.keys.books, &seed)?;
            tracing::info!(books = seed.len(), "seeded catalog");
            self.books = seed;
        }

        if self.storage.get(&self.keys.borrowed)?.is_none() {
            write_collection::<BorrowedBook>(&self.storage, &self.keys.borrowed, &[])?;
            self.borrowed.clear();
        }

        Ok(())
    }

    /// Every catalog entry in stored order.
    pub fn list_books(&self) -> &[Book] {
        &self.books
    }

    /// Every active loan in borrow order.
    pub fn list_borrowed(&self) -> &[BorrowedBook] {
        &self.borrowed
    }

    pub fn get_book(&self, book_id: &str) -> Option<&Book> {
        self.books.iter().find(|book| book.id == book_id)
    }

    /// Catalog entries whose title or author contains `query` (case-insensitive)
    /// and whose category equals `category`. An empty query matches everything;
    /// `None`, an empty string, or `"All"` disables the category filter.
    /// Availability is not consulted.
    pub fn search(&self, query: &str, category: Option<&str>) -> Vec<Book> {
        let needle = query.trim().to_lowercase();
        let category = category.filter(|c| !c.is_empty() && *c != ALL_CATEGORIES);

        self.books
            .iter()
            .filter(|book| {
                book.title.to_lowercase().contains(&needle)
                    || book.author.to_lowercase().contains(&needle)
            })
            .filter(|book| category.map_or(true, |c| book.category == c))
            .cloned()
            .collect()
    }

    /// `"All"` followed by each distinct category in order of first appearance.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::from([ALL_CATEGORIES]);
        let mut categories = vec![ALL_CATEGORIES.to_string()];

        for book in &self.books {
            if seen.insert(book.category.as_str()) {
                categories.push(book.category.clone());
            }
        }

        categories
    }

    /// Borrow a book now.
    pub fn borrow(&mut self, book_id: &str) -> Result<(), CatalogError> {
        self.borrow_at(book_id, OffsetDateTime::now_utc())
    }

    /// Borrow a book as of `now`; the loan falls due one loan period later.
    ///
    /// The loan cap is checked before the book itself.
    pub fn borrow_at(&mut self, book_id: &str, now: OffsetDateTime) -> Result<(), CatalogError> {
        if self.borrowed.len() >= self.policy.max_loans {
            tracing::debug!(book_id, limit = self.policy.max_loans, "borrow rejected: limit reached");
            return Err(CatalogError::BorrowLimitExceeded {
                limit: self.policy.max_loans,
            });
        }

        let Some(index) = self
            .books
            .iter()
            .position(|book| book.id == book_id && book.available)
        else {
            tracing::debug!(book_id, "borrow rejected: book unavailable");
            return Err(CatalogError::BookUnavailable {
                id: book_id.to_string(),
            });
        };

        let snapshot = self.snapshot();

        let book = &mut self.books[index];
        book.available = false;
        let loan = BorrowedBook {
            book: book.clone(),
            borrow_date: now,
            due_date: now + self.policy.loan_period,
        };
        let due_date = loan.due_date;
        self.borrowed.push(loan);

        self.commit(snapshot)?;

        tracing::info!(book_id, due = %due_date, "book borrowed");
        Ok(())
    }

    /// Return a borrowed book.
    ///
    /// A loan whose catalog entry has gone missing is still removed.
    pub fn return_book(&mut self, book_id: &str) -> Result<(), CatalogError> {
        let Some(index) = self.borrowed.iter().position(|loan| loan.id() == book_id) else {
            tracing::debug!(book_id, "return rejected: not borrowed");
            return Err(CatalogError::NotBorrowed {
                id: book_id.to_string(),
            });
        };

        let snapshot = self.snapshot();

        self.borrowed.remove(index);
        match self.books.iter_mut().find(|book| book.id == book_id) {
            Some(book) => book.available = true,
            None => tracing::warn!(book_id, "returned loan has no catalog entry"),
        }

        self.commit(snapshot)?;

        tracing::info!(book_id, "book returned");
        Ok(())
    }

    /// Overdue and due-soon loans as of now.
    pub fn due_status(&self) -> DueStatus {
        self.due_status_at(OffsetDateTime::now_utc())
    }

    pub fn due_status_at(&self, now: OffsetDateTime) -> DueStatus {
        let mut status = DueStatus::default();

        for loan in &self.borrowed {
            match self.policy.classify(loan.due_date, now) {
                LoanUrgency::Overdue => status.overdue.push(loan.clone()),
                LoanUrgency::DueSoon => status.due_soon.push(loan.clone()),
                LoanUrgency::OnTime => {}
            }
        }

        status
    }

    /// Every loan, overdue first, then due soon, then the rest; each group by due date.
    pub fn loans_by_urgency(&self) -> Vec<LoanView> {
        self.loans_by_urgency_at(OffsetDateTime::now_utc())
    }

    pub fn loans_by_urgency_at(&self, now: OffsetDateTime) -> Vec<LoanView> {
        let mut views: Vec<LoanView> = self
            .borrowed
            .iter()
            .map(|loan| LoanView {
                urgency: self.policy.classify(loan.due_date, now),
                days_remaining: days_remaining(loan.due_date, now),
                loan: loan.clone(),
            })
            .collect();

        views.sort_by_key(|view| (view.urgency, view.loan.due_date));
        views
    }

    pub fn summary(&self) -> CatalogSummary {
        self.summary_at(OffsetDateTime::now_utc())
    }

    pub fn summary_at(&self, now: OffsetDateTime) -> CatalogSummary {
        let status = self.due_status_at(now);
        CatalogSummary {
            borrowed: self.borrowed.len(),
            limit: self.policy.max_loans,
            overdue: status.overdue.len(),
            due_soon: status.due_soon.len(),
        }
    }

    fn snapshot(&self) -> (Vec<Book>, Vec<BorrowedBook>) {
        (self.books.clone(), self.borrowed.clone())
    }

    /// Persist both collections. On failure the in-memory state is put back
    /// and a best-effort rewrite of it is attempted before the error surfaces.
    fn commit(&mut self, snapshot: (Vec<Book>, Vec<BorrowedBook>)) -> Result<(), CatalogError> {
        let Err(err) = self.flush() else {
            return Ok(());
        };

        let (books, borrowed) = snapshot;
        self.books = books;
        self.borrowed = borrowed;

        if let Err(restore_err) = self.flush() {
            tracing::error!(error = %restore_err, "failed to restore catalog after write failure");
        }
        Err(err)
    }

    fn flush(&self) -> Result<(), CatalogError> {
        write_collection(&self.storage, &self.keys.books, &self.books)?;
        write_collection(&self.storage, &self.keys.borrowed, &self.borrowed)
    }
}

impl<S> std::fmt::Debug for CatalogStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("keys", &self.keys)
            .field("policy", &self.policy)
            .field("books", &self.books.len())
            .field("borrowed", &self.borrowed.len())
            .finish_non_exhaustive()
    }
}

fn read_collection<T: DeserializeOwned>(
    storage: &impl KvStore,
    key: &str,
) -> Result<Vec<T>, CatalogError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str(&raw) {
        Ok(items) => Ok(items),
        Err(e) => {
            tracing::warn!(key, error = %e, "stored collection is unreadable, treating as empty");
            Ok(Vec::new())
        }
    }
}

fn write_collection<T: Serialize>(
    storage: &impl KvStore,
    key: &str,
    items: &[T],
) -> Result<(), CatalogError> {
    let raw = serde_json::to_string(items).map_err(|source| CatalogError::Encode {
        key: key.to_string(),
        source,
    })?;
    storage.set(key, raw)?;
    Ok(())
}
