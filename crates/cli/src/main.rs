use anyhow::Context;
use clap::{Parser, Subcommand};
use libris_app::catalog::{open_catalog, CatalogStore};
use libris_kernel::settings::Settings;
use libris_storage::KvStore;
use serde::Serialize;

/// Browse, search, borrow and return books in the libris catalog.
#[derive(Debug, Parser)]
#[command(name = "libris", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    #[command(flatten)]
    Catalog(CatalogCommand),
}

/// One-shot operations against the configured catalog storage
#[derive(Debug, Subcommand)]
enum CatalogCommand {
    /// List every book in the catalog
    Books,
    /// Search by title or author
    Search {
        /// Case-insensitive text matched against title and author
        #[arg(default_value = "")]
        query: String,
        /// Exact category; "All" disables the filter
        #[arg(long, short)]
        category: Option<String>,
    },
    /// List categories, "All" first
    Categories,
    /// Borrow a book by id
    Borrow { id: String },
    /// Return a borrowed book by id
    Return { id: String },
    /// List active loans, most urgent first
    Borrowed,
    /// Show overdue and due-soon loans
    Due,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => {
            let runtime =
                tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            runtime.block_on(libris_app::serve(&settings))
        }
        Command::Catalog(command) => {
            let mut catalog = open_catalog(&settings)?;
            catalog
                .initialize()
                .with_context(|| "failed to seed catalog")?;
            run(command, &mut catalog)
        }
    }
}

fn run<S: KvStore>(command: CatalogCommand, catalog: &mut CatalogStore<S>) -> anyhow::Result<()> {
    tracing::debug!(?command, "running catalog command");

    match command {
        CatalogCommand::Books => print_json(catalog.list_books()),
        CatalogCommand::Search { query, category } => {
            print_json(&catalog.search(&query, category.as_deref()))
        }
        CatalogCommand::Categories => print_json(&catalog.categories()),
        CatalogCommand::Borrow { id } => {
            catalog.borrow(&id)?;
            println!("borrowed {}", id);
            Ok(())
        }
        CatalogCommand::Return { id } => {
            catalog.return_book(&id)?;
            println!("returned {}", id);
            Ok(())
        }
        CatalogCommand::Borrowed => print_json(&catalog.loans_by_urgency()),
        CatalogCommand::Due => print_json(&catalog.due_status()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{}", rendered);
    Ok(())
}
