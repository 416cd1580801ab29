//! Bulk import of outward invoices from tabular rows.
//!
//! The pipeline runs in stages over the whole batch: parse, check columns,
//! resolve customers, group rows by invoice number, reject numbers already
//! used in the same fiscal year, then persist. Only structural problems
//! (unknown business, unreadable input, missing columns, no rows) fail the
//! call. Everything else is reported in [`ImportSummary::errors`] and the
//! rest of the batch carries on.

use crate::{
    config::settings::LineItemDefaults,
    core::{
        business::require_business,
        customer::find_customers_by_names,
        direction::Direction,
        fiscal::FiscalYear,
        invoice::{NewInvoice, insert_invoice, recalculate_invoice_total},
        line_item::{LineItemInput, insert_line_item},
        product::get_products_by_names,
        units::Unit,
    },
    entities::{Invoice, invoice},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Columns every import file must carry
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "invoice_number",
    "invoice_date",
    "customer_name",
    "product_name",
    "quantity",
    "rate",
];

/// Accepted invoice date layouts, tried in order
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// One raw data row. Values stay as text until the row is priced so a bad
/// cell only costs that row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImportRow {
    /// Line in the source file (the header is line 1)
    #[serde(skip)]
    pub line: u64,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub invoice_date: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub rate: String,
    #[serde(default, alias = "hsn_code")]
    pub classification_code: Option<String>,
    #[serde(default, alias = "gst_tax_rate")]
    pub tax_rate: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ImportRow {
    /// Converts the text cells into a line-item input
    pub fn to_input(&self) -> Result<LineItemInput> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let tax_rate = present(&self.tax_rate)
            .map(|raw| parse_tax_rate(&raw))
            .transpose()?;
        let unit = present(&self.unit)
            .map(|raw| raw.parse::<Unit>())
            .transpose()?;

        Ok(LineItemInput {
            product_name: self.product_name.trim().to_string(),
            classification_code: present(&self.classification_code),
            tax_rate,
            quantity: parse_decimal("quantity", &self.quantity)?,
            rate: parse_decimal("rate", &self.rate)?,
            unit,
        })
    }
}

/// Outcome of an import; partial success is the normal case
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub invoices_created: usize,
    pub line_items_created: usize,
    /// Human-readable problems in the order they were found
    pub errors: Vec<String>,
}

/// Rows sharing one invoice number; date and customer come from the first row
#[derive(Debug)]
struct InvoiceGroup {
    invoice_number: String,
    invoice_date: String,
    customer_name: String,
    rows: Vec<ImportRow>,
}

/// Parses an invoice date in any of the accepted layouts
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|_| Error::Validation {
        message: format!("invalid {field} '{raw}'"),
    })
}

/// Tax rates are fractions (`0.03`); a trailing `%` marks a percentage (`3%`).
fn parse_tax_rate(raw: &str) -> Result<Decimal> {
    match raw.strip_suffix('%') {
        Some(percent) => parse_decimal("tax rate", percent)?
            .checked_div(Decimal::ONE_HUNDRED)
            .ok_or(Error::Overflow {
                operation: "tax rate",
            }),
        None => parse_decimal("tax rate", raw),
    }
}

/// Rows read from a file, plus the records that could not be read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRows {
    pub rows: Vec<ImportRow>,
    /// `Row <line>: <reason>` for every unreadable record
    pub errors: Vec<String>,
}

/// Reads CSV rows with a header line.
///
/// A record with the wrong number of cells or undecodable text is reported
/// in [`ParsedRows::errors`] and skipped.
///
/// # Errors
/// Fails on an unreadable source or header, absent required columns or a
/// file without data records.
pub fn parse_rows<R: io::Read>(reader: R) -> Result<ParsedRows> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(Error::EmptyImport);
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| (*column).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns { columns: missing });
    }

    let byte_headers = csv.byte_headers()?.clone();
    let mut parsed = ParsedRows::default();
    let mut records = 0usize;
    for record in csv.byte_records() {
        records += 1;
        let record = match record {
            Ok(record) => record,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                let line = e.position().map_or(0, csv::Position::line);
                parsed.errors.push(format!("Row {line}: {e}"));
                continue;
            }
        };

        let line = record.position().map_or(0, csv::Position::line);
        if record.len() != byte_headers.len() {
            parsed.errors.push(format!(
                "Row {line}: expected {} fields, found {}",
                byte_headers.len(),
                record.len()
            ));
            continue;
        }
        match record.deserialize::<ImportRow>(Some(&byte_headers)) {
            Ok(mut row) => {
                row.line = line;
                parsed.rows.push(row);
            }
            Err(e) => parsed.errors.push(format!("Row {line}: {e}")),
        }
    }

    if records == 0 {
        return Err(Error::EmptyImport);
    }
    debug!(
        rows = parsed.rows.len(),
        skipped = parsed.errors.len(),
        "Parsed import rows"
    );
    Ok(parsed)
}

/// Distinct values in first-seen order
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}

/// Imports pre-parsed rows as outward invoices of `business_id`.
///
/// Everything that persists does so in one database transaction.
pub async fn import_invoices(
    db: &DatabaseConnection,
    business_id: i64,
    rows: Vec<ImportRow>,
    defaults: &LineItemDefaults,
) -> Result<ImportSummary> {
    let parsed = ParsedRows {
        rows,
        errors: Vec::new(),
    };
    import_parsed(db, business_id, parsed, defaults).await
}

async fn import_parsed(
    db: &DatabaseConnection,
    business_id: i64,
    parsed: ParsedRows,
    defaults: &LineItemDefaults,
) -> Result<ImportSummary> {
    let ParsedRows { rows, errors } = parsed;
    if rows.is_empty() && errors.is_empty() {
        return Err(Error::EmptyImport);
    }

    let txn = db.begin().await?;
    let business = require_business(&txn, business_id).await?;
    let mut summary = ImportSummary {
        errors,
        ..ImportSummary::default()
    };

    // Customers
    let names = distinct(rows.iter().map(|row| row.customer_name.as_str()));
    let customers = find_customers_by_names(&txn, business.id, &names).await?;
    for name in names.iter().filter(|name| !customers.contains_key(*name)) {
        warn!(business_id, customer = %name, "Unknown customer in import");
        summary.errors.push(format!(
            "Customer '{name}' does not exist in the database for this business"
        ));
    }

    // Grouping
    let mut groups: Vec<InvoiceGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in rows {
        if !customers.contains_key(&row.customer_name) {
            continue;
        }
        if row.invoice_number.trim().is_empty() {
            summary
                .errors
                .push(format!("Row {}: Missing invoice number", row.line));
            continue;
        }

        let slot = *index.entry(row.invoice_number.clone()).or_insert_with(|| {
            groups.push(InvoiceGroup {
                invoice_number: row.invoice_number.clone(),
                invoice_date: row.invoice_date.clone(),
                customer_name: row.customer_name.clone(),
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        if let Some(group) = groups.get_mut(slot) {
            group.rows.push(row);
        }
    }

    // Duplicates within a fiscal year
    let numbers: Vec<String> = groups.iter().map(|g| g.invoice_number.clone()).collect();
    let mut taken: HashMap<String, Vec<NaiveDate>> = HashMap::new();
    if !numbers.is_empty() {
        for existing in Invoice::find()
            .filter(invoice::Column::BusinessId.eq(business.id))
            .filter(invoice::Column::Direction.eq(Direction::Outward.as_str()))
            .filter(invoice::Column::InvoiceNumber.is_in(numbers))
            .all(&txn)
            .await?
        {
            taken
                .entry(existing.invoice_number)
                .or_default()
                .push(existing.invoice_date);
        }
    }

    let (duplicates, groups): (Vec<InvoiceGroup>, Vec<InvoiceGroup>) =
        groups.into_iter().partition(|group| {
            let Some(date) = parse_date(&group.invoice_date) else {
                return false;
            };
            let year = FiscalYear::containing(date);
            taken
                .get(&group.invoice_number)
                .is_some_and(|dates| dates.iter().any(|existing| year.contains(*existing)))
        });
    if !duplicates.is_empty() {
        let list = duplicates
            .iter()
            .map(|g| g.invoice_number.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        warn!(business_id, numbers = %list, "Duplicate invoice numbers in import");
        summary.errors.push(format!(
            "Duplicate invoice numbers found in the same financial year: {list}"
        ));
    }

    // Persistence
    let product_names = distinct(
        groups
            .iter()
            .flat_map(|g| g.rows.iter().map(|row| row.product_name.trim())),
    );
    let products = get_products_by_names(&txn, &product_names).await?;

    for group in groups {
        let Some(invoice_date) = parse_date(&group.invoice_date) else {
            summary.errors.push(format!(
                "Invoice {}: invalid invoice date '{}'",
                group.invoice_number, group.invoice_date
            ));
            continue;
        };
        let Some(customer) = customers.get(&group.customer_name) else {
            continue;
        };

        let new_invoice = NewInvoice {
            business_id: business.id,
            customer_id: customer.id,
            invoice_number: group.invoice_number.clone(),
            invoice_date,
            direction: Direction::Outward,
        };
        let invoice = match insert_invoice(&txn, new_invoice).await {
            Ok(invoice) => invoice,
            Err(e) => {
                warn!(business_id, number = %group.invoice_number, error = %e, "Failed to create invoice");
                summary
                    .errors
                    .push(format!("Invoice {}: {e}", group.invoice_number));
                continue;
            }
        };
        summary.invoices_created += 1;

        for row in group.rows {
            let product = products.get(row.product_name.trim());
            let created = match row.to_input() {
                Ok(input) => insert_line_item(&txn, &invoice, input, product, defaults).await,
                Err(e) => Err(e),
            };
            match created {
                Ok(_) => summary.line_items_created += 1,
                Err(e) => {
                    debug!(line = row.line, error = %e, "Skipped import row");
                    summary.errors.push(format!("Row {}: {e}", row.line));
                }
            }
        }

        recalculate_invoice_total(&txn, invoice.id).await?;
    }

    txn.commit().await?;

    info!(
        business_id,
        invoices = summary.invoices_created,
        line_items = summary.line_items_created,
        errors = summary.errors.len(),
        "Import finished"
    );
    Ok(summary)
}

/// Parses CSV from `reader` and imports it.
pub async fn import_csv<R: io::Read>(
    db: &DatabaseConnection,
    business_id: i64,
    reader: R,
    defaults: &LineItemDefaults,
) -> Result<ImportSummary> {
    let parsed = parse_rows(reader)?;
    import_parsed(db, business_id, parsed, defaults).await
}
