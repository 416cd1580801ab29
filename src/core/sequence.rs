//! Next invoice number suggestion per business, direction and fiscal year.
//!
//! The suggestion is advisory. Nothing stops a caller from saving any number.

use crate::{
    core::{direction::Direction, fiscal::FiscalYear},
    entities::{Invoice, invoice},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QuerySelect, prelude::*};
use tracing::warn;

/// Suggests the next invoice number for the fiscal year containing today.
pub async fn next_invoice_number<C>(db: &C, business_id: i64, direction: Direction) -> Result<i64>
where
    C: ConnectionTrait,
{
    let today = chrono::Local::now().date_naive();
    next_invoice_number_on(db, business_id, direction, today).await
}

/// Suggests the next invoice number for the fiscal year containing `today`.
///
/// Returns 1 when the window has no invoices or its highest number is not an
/// integer.
pub async fn next_invoice_number_on<C>(
    db: &C,
    business_id: i64,
    direction: Direction,
    today: NaiveDate,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    let window = FiscalYear::containing(today);

    let numbers: Vec<String> = Invoice::find()
        .select_only()
        .column(invoice::Column::InvoiceNumber)
        .filter(invoice::Column::BusinessId.eq(business_id))
        .filter(invoice::Column::Direction.eq(direction.as_str()))
        .filter(invoice::Column::InvoiceDate.between(window.start(), window.end()))
        .into_tuple::<String>()
        .all(db)
        .await?;

    let Some(highest) = highest_number(&numbers) else {
        return Ok(1);
    };

    match highest {
        Ok(n) => n.checked_add(1).ok_or(Error::Overflow {
            operation: "next invoice number",
        }),
        Err(raw) => {
            warn!(
                business_id,
                direction = %direction,
                fiscal_year = %window,
                invoice_number = raw,
                "Highest invoice number is not numeric, restarting at 1"
            );
            Ok(1)
        }
    }
}

/// Highest number in `numbers`: numeric when all parse, otherwise the
/// lexical maximum (as `Err` when it does not parse).
fn highest_number(numbers: &[String]) -> Option<std::result::Result<i64, &str>> {
    let parsed: Option<Vec<i64>> = numbers.iter().map(|n| n.trim().parse().ok()).collect();
    match parsed {
        Some(values) => values.into_iter().max().map(Ok),
        None => numbers
            .iter()
            .map(|n| n.trim())
            .max()
            .map(|top| top.parse().map_err(|_| top)),
    }
}
