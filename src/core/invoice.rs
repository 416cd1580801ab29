//! Invoice business logic - Creating, querying and summarising invoices.
//!
//! `total_amount` is never set directly. Every line-item mutation calls
//! [`recalculate_invoice_total`] inside the same database transaction.

use crate::{
    core::{
        business::require_business,
        customer::require_customer,
        direction::Direction,
        tax::{self, TaxTotals},
    },
    entities::{Invoice, LineItem, invoice, line_item},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{IntoActiveModel, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::debug;

/// Input for [`create_invoice`]
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub business_id: i64,
    pub customer_id: i64,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub direction: Direction,
}

/// Optional filters for [`get_invoices_for_business`]
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceFilter {
    pub direction: Option<Direction>,
    /// Inclusive lower bound on the invoice date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the invoice date
    pub to: Option<NaiveDate>,
}

/// Creates an invoice with a zero total.
///
/// The business and customer must exist. Duplicate invoice numbers are
/// accepted here; only the bulk import rejects them.
pub async fn create_invoice(db: &DatabaseConnection, new: NewInvoice) -> Result<invoice::Model> {
    insert_invoice(db, new).await
}

/// Inserts an invoice on any connection, deciding its cross-jurisdiction flag.
pub async fn insert_invoice<C>(conn: &C, new: NewInvoice) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    let invoice_number = new.invoice_number.trim().to_string();
    if invoice_number.is_empty() {
        return Err(Error::Validation {
            message: "Invoice number cannot be empty".to_string(),
        });
    }

    let business = require_business(conn, new.business_id).await?;
    let customer = require_customer(conn, new.customer_id).await?;
    let is_cross = tax::is_cross_jurisdiction(&business.tax_id(), customer.tax_id().as_ref());

    let now = chrono::Utc::now().naive_utc();
    let invoice = invoice::ActiveModel {
        business_id: Set(business.id),
        customer_id: Set(customer.id),
        invoice_number: Set(invoice_number),
        invoice_date: Set(new.invoice_date),
        direction: Set(new.direction.as_str().to_string()),
        is_cross_jurisdiction: Set(is_cross),
        total_amount: Set(Decimal::ZERO.into()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    debug!(
        invoice_id = invoice.id,
        number = %invoice.invoice_number,
        cross_jurisdiction = is_cross,
        "Created invoice"
    );
    Ok(invoice)
}

/// Retrieves an invoice by id
pub async fn get_invoice_by_id<C>(db: &C, invoice_id: i64) -> Result<Option<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find_by_id(invoice_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an invoice by id, failing with [`Error::InvoiceNotFound`] when absent
pub async fn require_invoice<C>(db: &C, invoice_id: i64) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    get_invoice_by_id(db, invoice_id)
        .await?
        .ok_or(Error::InvoiceNotFound { id: invoice_id })
}

/// Invoices of a business ordered by date then number
pub async fn get_invoices_for_business<C>(
    db: &C,
    business_id: i64,
    filter: InvoiceFilter,
) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Invoice::find().filter(invoice::Column::BusinessId.eq(business_id));
    if let Some(direction) = filter.direction {
        query = query.filter(invoice::Column::Direction.eq(direction.as_str()));
    }
    if let Some(from) = filter.from {
        query = query.filter(invoice::Column::InvoiceDate.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(invoice::Column::InvoiceDate.lte(to));
    }

    query
        .order_by_asc(invoice::Column::InvoiceDate)
        .order_by_asc(invoice::Column::InvoiceNumber)
        .order_by_asc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sets the invoice total to the exact sum of its current line items.
///
/// Idempotent. Callers run it on the same transaction as the line-item write.
pub async fn recalculate_invoice_total<C>(conn: &C, invoice_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let invoice = require_invoice(conn, invoice_id).await?;

    let total = LineItem::find()
        .filter(line_item::Column::InvoiceId.eq(invoice_id))
        .all(conn)
        .await?
        .iter()
        .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(*item.amount))
        .ok_or(Error::Overflow {
            operation: "invoice total",
        })?;

    let mut active = invoice.into_active_model();
    active.total_amount = Set(total.into());
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(conn).await?;

    Ok(total)
}

/// Deletes an invoice together with its line items.
pub async fn delete_invoice(db: &DatabaseConnection, invoice_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    require_invoice(&txn, invoice_id).await?;
    LineItem::delete_many()
        .filter(line_item::Column::InvoiceId.eq(invoice_id))
        .exec(&txn)
        .await?;
    Invoice::delete_by_id(invoice_id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Totals shown at the foot of a printed invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    pub invoice_id: i64,
    pub invoice_number: String,
    pub total_items: usize,
    pub amount_without_tax: Decimal,
    pub origin_tax: Decimal,
    pub destination_tax: Decimal,
    pub cross_tax: Decimal,
    pub total_tax: Decimal,
    /// Exact persisted total
    pub total_amount: Decimal,
    /// Whole-number total for display
    pub rounded_total: Decimal,
    /// Signed display adjustment, e.g. `"-0.37"`
    pub round_off: String,
}

/// Builds the summary of an invoice from its current line items.
pub async fn get_invoice_summary<C>(db: &C, invoice_id: i64) -> Result<InvoiceSummary>
where
    C: ConnectionTrait,
{
    let invoice = require_invoice(db, invoice_id).await?;
    let items = LineItem::find()
        .filter(line_item::Column::InvoiceId.eq(invoice_id))
        .all(db)
        .await?;

    let mut totals = TaxTotals::default();
    for item in &items {
        totals.add_row(
            tax::net_amount(*item.quantity, *item.rate)?,
            *item.origin_tax,
            *item.destination_tax,
            *item.cross_tax,
            *item.amount,
        )?;
    }

    let rounding = tax::round_off(*invoice.total_amount);
    Ok(InvoiceSummary {
        invoice_id: invoice.id,
        invoice_number: invoice.invoice_number,
        total_items: items.len(),
        amount_without_tax: totals.taxable_value,
        origin_tax: totals.origin_tax,
        destination_tax: totals.destination_tax,
        cross_tax: totals.cross_tax,
        total_tax: totals.total_tax()?,
        total_amount: *invoice.total_amount,
        rounded_total: rounding.rounded,
        round_off: rounding.display(),
    })
}

impl invoice::Model {
    /// Parsed direction of the invoice
    pub fn direction(&self) -> Result<Direction> {
        self.direction.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::LineItemDefaults;
    use crate::core::line_item::{LineItemInput, create_line_item};
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_create_invoice_same_jurisdiction() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", Some("27BBB")).await?;

        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;
        assert!(!invoice.is_cross_jurisdiction);
        assert_eq!(invoice.total_amount, dec!(0));
        assert_eq!(invoice.direction()?, Direction::Outward);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_invoice_cross_jurisdiction() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", Some("33BBB")).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;
        assert!(invoice.is_cross_jurisdiction);
        Ok(())
    }

    #[tokio::test]
    async fn test_customer_without_tax_id_is_same_jurisdiction() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", None).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;
        assert!(!invoice.is_cross_jurisdiction);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_invoice_requires_parties() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", None).await?;
        let date = NaiveDate::from_ymd_opt(2023, 6, 1).ok_or(Error::InvalidDate {
            value: "2023-06-01".to_string(),
        })?;

        let missing_business = create_invoice(
            &db,
            NewInvoice {
                business_id: 999,
                customer_id: customer.id,
                invoice_number: "1".to_string(),
                invoice_date: date,
                direction: Direction::Outward,
            },
        )
        .await;
        assert!(matches!(
            missing_business,
            Err(Error::BusinessNotFound { id: 999 })
        ));

        let missing_customer = create_invoice(
            &db,
            NewInvoice {
                business_id: business.id,
                customer_id: 999,
                invoice_number: "1".to_string(),
                invoice_date: date,
                direction: Direction::Outward,
            },
        )
        .await;
        assert!(matches!(
            missing_customer,
            Err(Error::CustomerNotFound { id: 999 })
        ));

        let blank_number = create_invoice(
            &db,
            NewInvoice {
                business_id: business.id,
                customer_id: customer.id,
                invoice_number: "   ".to_string(),
                invoice_date: date,
                direction: Direction::Outward,
            },
        )
        .await;
        assert!(matches!(blank_number, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_numbers_allowed_for_single_creation() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", None).await?;
        create_test_invoice(&db, business.id, customer.id, "5", "2023-06-01").await?;
        create_test_invoice(&db, business.id, customer.id, "5", "2023-06-02").await?;

        let invoices = get_invoices_for_business(&db, business.id, InvoiceFilter::default()).await?;
        assert_eq!(invoices.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_invoices_for_business_filters() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", None).await?;
        create_test_invoice(&db, business.id, customer.id, "2", "2023-06-10").await?;
        create_test_invoice(&db, business.id, customer.id, "1", "2023-05-10").await?;
        create_test_inward_invoice(&db, business.id, customer.id, "P-1", "2023-06-05").await?;

        let all = get_invoices_for_business(&db, business.id, InvoiceFilter::default()).await?;
        let numbers: Vec<&str> = all.iter().map(|i| i.invoice_number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "P-1", "2"]);

        let outward = get_invoices_for_business(
            &db,
            business.id,
            InvoiceFilter {
                direction: Some(Direction::Outward),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(outward.len(), 2);

        let june = get_invoices_for_business(
            &db,
            business.id,
            InvoiceFilter {
                from: NaiveDate::from_ymd_opt(2023, 6, 1),
                to: NaiveDate::from_ymd_opt(2023, 6, 30),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(june.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_recalculate_is_idempotent() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", Some("27BBB")).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;
        let defaults = LineItemDefaults::default();
        create_line_item(
            &db,
            invoice.id,
            test_line_item("Ring", dec!(2), dec!(500), dec!(0.18)),
            &defaults,
        )
        .await?;

        let first = recalculate_invoice_total(&db, invoice.id).await?;
        let second = recalculate_invoice_total(&db, invoice.id).await?;
        assert_eq!(first, dec!(1180));
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_invoice_summary() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", Some("27BBB")).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;
        let defaults = LineItemDefaults::default();
        create_line_item(
            &db,
            invoice.id,
            test_line_item("Ring", dec!(2), dec!(500), dec!(0.18)),
            &defaults,
        )
        .await?;
        create_line_item(
            &db,
            invoice.id,
            LineItemInput {
                product_name: "Chain".to_string(),
                quantity: dec!(0.5),
                rate: dec!(1),
                tax_rate: Some(dec!(0)),
                ..Default::default()
            },
            &defaults,
        )
        .await?;

        let summary = get_invoice_summary(&db, invoice.id).await?;
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.amount_without_tax, dec!(1000.5));
        assert_eq!(summary.origin_tax, dec!(90));
        assert_eq!(summary.destination_tax, dec!(90));
        assert_eq!(summary.cross_tax, dec!(0));
        assert_eq!(summary.total_tax, dec!(180));
        assert_eq!(summary.total_amount, dec!(1180.5));
        assert_eq!(summary.rounded_total, dec!(1181));
        assert_eq!(summary.round_off, "+0.50");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_invoice_removes_line_items() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", None).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;
        let defaults = LineItemDefaults::default();
        create_line_item(
            &db,
            invoice.id,
            test_line_item("Ring", dec!(1), dec!(100), dec!(0.03)),
            &defaults,
        )
        .await?;

        delete_invoice(&db, invoice.id).await?;
        assert!(get_invoice_by_id(&db, invoice.id).await?.is_none());
        assert_eq!(LineItem::find().all(&db).await?.len(), 0);

        let again = delete_invoice(&db, invoice.id).await;
        assert!(matches!(again, Err(Error::InvoiceNotFound { .. })));
        Ok(())
    }
}
