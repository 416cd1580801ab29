//! Shared test utilities for taxbill.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        business::{self, NewBusiness},
        customer::{self, NewCustomer},
        direction::Direction,
        invoice::{self, NewInvoice},
        line_item::LineItemInput,
        product,
    },
    entities,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test business.
///
/// # Defaults
/// * `address`: "1 Test Street"
/// * `mobile_number`: "9999999999"
/// * `jurisdiction_name`: derived from the tax id
pub async fn create_test_business(
    db: &DatabaseConnection,
    name: &str,
    tax_id: &str,
) -> Result<entities::business::Model> {
    business::create_business(
        db,
        NewBusiness {
            name: name.to_string(),
            address: "1 Test Street".to_string(),
            tax_id: tax_id.to_string(),
            mobile_number: "9999999999".to_string(),
            ..Default::default()
        },
    )
    .await
}

/// Creates a test customer linked to one business.
pub async fn create_test_customer(
    db: &DatabaseConnection,
    name: &str,
    tax_id: Option<&str>,
    business_id: i64,
) -> Result<entities::customer::Model> {
    customer::create_customer(
        db,
        NewCustomer {
            name: name.to_string(),
            tax_id: tax_id.map(str::to_string),
            business_ids: vec![business_id],
            ..Default::default()
        },
    )
    .await
}

/// Creates a catalog product with classification code "7118".
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    tax_rate: Decimal,
) -> Result<entities::product::Model> {
    product::create_product(db, name.to_string(), "7118".to_string(), tax_rate).await
}

fn parse_test_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| Error::InvalidDate {
        value: raw.to_string(),
    })
}

/// Creates an outward invoice dated `date` (`YYYY-MM-DD`).
pub async fn create_test_invoice(
    db: &DatabaseConnection,
    business_id: i64,
    customer_id: i64,
    number: &str,
    date: &str,
) -> Result<entities::invoice::Model> {
    invoice::create_invoice(
        db,
        NewInvoice {
            business_id,
            customer_id,
            invoice_number: number.to_string(),
            invoice_date: parse_test_date(date)?,
            direction: Direction::Outward,
        },
    )
    .await
}

/// Creates an inward invoice dated `date` (`YYYY-MM-DD`).
pub async fn create_test_inward_invoice(
    db: &DatabaseConnection,
    business_id: i64,
    customer_id: i64,
    number: &str,
    date: &str,
) -> Result<entities::invoice::Model> {
    invoice::create_invoice(
        db,
        NewInvoice {
            business_id,
            customer_id,
            invoice_number: number.to_string(),
            invoice_date: parse_test_date(date)?,
            direction: Direction::Inward,
        },
    )
    .await
}

/// Line-item input with an explicit tax rate; classification code and unit
/// fall through to the catalog and settings.
pub fn test_line_item(
    product_name: &str,
    quantity: Decimal,
    rate: Decimal,
    tax_rate: Decimal,
) -> LineItemInput {
    LineItemInput {
        product_name: product_name.to_string(),
        quantity,
        rate,
        tax_rate: Some(tax_rate),
        ..Default::default()
    }
}

/// Sets up a database with "Test Business" and a linked "Test Customer".
/// Returns (db, business, customer) for invoice-related tests.
pub async fn setup_with_parties(
    business_tax_id: &str,
    customer_tax_id: Option<&str>,
) -> Result<(
    DatabaseConnection,
    entities::business::Model,
    entities::customer::Model,
)> {
    let db = setup_test_db().await?;
    let business = create_test_business(&db, "Test Business", business_tax_id).await?;
    let customer = create_test_customer(&db, "Test Customer", customer_tax_id, business.id).await?;
    Ok((db, business, customer))
}
