//! Database configuration module for taxbill.
//!
//! Handles the `SQLite` connection and creates every table from the entity
//! definitions with `SeaORM`'s `Schema::create_table_from_entity`, so the schema
//! always matches the Rust structs without hand-written SQL.

use crate::entities::{Business, Customer, CustomerBusiness, Invoice, LineItem, Product, invoice};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::env::VarError;
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/taxbill.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable,
/// falling back to a local `SQLite` file when it is unset.
///
/// # Errors
/// Returns [`crate::errors::Error::EnvVar`] when the variable is set but is
/// not valid unicode.
pub fn get_database_url() -> Result<String> {
    database_url_from(std::env::var("DATABASE_URL"))
}

fn database_url_from(var: std::result::Result<String, VarError>) -> Result<String> {
    match var {
        Ok(url) => Ok(url),
        Err(VarError::NotPresent) => Ok(DEFAULT_DATABASE_URL.to_string()),
        Err(e) => Err(e.into()),
    }
}

/// Creates the parent directory of a file-backed `SQLite` URL.
///
/// In-memory and non-`SQLite` URLs are left alone.
pub fn ensure_sqlite_directory(database_url: &str) -> Result<()> {
    let Some(rest) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.contains(":memory:") || path == "memory" {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    tracing::debug!("Connecting to database at {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables (parents before children) and the invoice lookup index.
///
/// Safe to run against an existing database: every statement is `IF NOT EXISTS`.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    create_table(db, Business).await?;
    create_table(db, Customer).await?;
    create_table(db, CustomerBusiness).await?;
    create_table(db, Product).await?;
    create_table(db, Invoice).await?;
    create_table(db, LineItem).await?;

    let builder = db.get_database_backend();
    let index = Index::create()
        .if_not_exists()
        .name("idx_invoices_business_direction_number")
        .table(Invoice)
        .col(invoice::Column::BusinessId)
        .col(invoice::Column::Direction)
        .col(invoice::Column::InvoiceNumber)
        .to_owned();
    db.execute(builder.build(&index)).await?;

    Ok(())
}
