//! Unified error type for taxbill.
//!
//! Structural failures (missing parties, unreadable input, bad columns) are
//! represented here and propagated with `?`. Row-level import problems are not
//! errors in this sense; they are collected as messages in
//! [`crate::core::import::ImportSummary`].

use rust_decimal::Decimal;
use thiserror::Error;

/// All errors that can abort a taxbill operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Input failed validation before reaching storage
    #[error("Validation error: {message}")]
    Validation {
        /// What went wrong
        message: String,
    },

    /// Storage layer failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// CSV could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable set but unreadable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Referenced business does not exist
    #[error("Business not found: {id}")]
    BusinessNotFound {
        /// Requested business id
        id: i64,
    },

    /// Referenced customer does not exist
    #[error("Customer not found: {id}")]
    CustomerNotFound {
        /// Requested customer id
        id: i64,
    },

    /// Referenced invoice does not exist
    #[error("Invoice not found: {id}")]
    InvoiceNotFound {
        /// Requested invoice id
        id: i64,
    },

    /// Referenced line item does not exist
    #[error("Line item not found: {id}")]
    LineItemNotFound {
        /// Requested line item id
        id: i64,
    },

    /// A quantity, rate or amount was negative
    #[error("Invalid {field}: {amount}")]
    InvalidAmount {
        /// Which input was rejected
        field: &'static str,
        /// The rejected value
        amount: Decimal,
    },

    /// Tax rate outside of [0, 1]
    #[error("Invalid tax rate: {rate} (expected a fraction between 0 and 1)")]
    InvalidTaxRate {
        /// The rejected rate
        rate: Decimal,
    },

    /// Fixed-point arithmetic overflowed
    #[error("Arithmetic overflow while computing {operation}")]
    Overflow {
        /// The computation that overflowed
        operation: &'static str,
    },

    /// A date string could not be parsed
    #[error("Invalid date: '{value}'")]
    InvalidDate {
        /// The raw input
        value: String,
    },

    /// Report range ends before it starts
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// Range start
        start: chrono::NaiveDate,
        /// Range end
        end: chrono::NaiveDate,
    },

    /// Unknown invoice direction or direction filter
    #[error("Invalid invoice direction: '{value}'")]
    InvalidDirection {
        /// The raw input
        value: String,
    },

    /// Unknown unit of measure
    #[error("Invalid unit: '{value}'")]
    InvalidUnit {
        /// The raw input
        value: String,
    },

    /// Import input contained no data rows
    #[error("Import file is empty")]
    EmptyImport,

    /// Import input lacks required columns
    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumns {
        /// Names of the absent columns
        columns: Vec<String>,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
