//! Report generation business logic.
//!
//! A report covers a date range and a direction filter. For every business it
//! lists one section per (calendar month, direction) that has line items,
//! then one aggregate section per requested direction with the cross-month
//! sums. All sums are exact; formatting happens only in [`ReportRow::cells`].

use crate::{
    core::{
        business::get_all_businesses,
        direction::{Direction, DirectionFilter},
        tax::{self, TaxTotals},
    },
    entities::{Customer, Invoice, LineItem, business, customer, invoice, line_item},
    errors::{Error, Result},
};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info};

/// Column headers of every section, in output order
pub const REPORT_COLUMNS: [&str; 15] = [
    "S.No.",
    "Bill No.",
    "Invoice Date",
    "Party Name",
    "Tax ID",
    "Commodity",
    "Classification Code",
    "Tax Rate",
    "Quantity",
    "Rate",
    "Taxable Value",
    "Origin Tax",
    "Destination Tax",
    "Cross Tax",
    "Total Invoice Value",
];

/// Label of the subtotal row
pub const SUBTOTAL_LABEL: &str = "Grand Total";

/// Column of the subtotal label, under "Commodity"
const SUBTOTAL_LABEL_COLUMN: usize = 5;

/// First numeric column, "Taxable Value"
const FIRST_AMOUNT_COLUMN: usize = 10;

const REPORT_DATE_FORMAT: &str = "%d-%m-%Y";
const INPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Splits `[start, end]` into calendar-month sub-ranges.
///
/// The first range starts at `start` and the last ends at `end`; the rest are
/// whole months. An inverted range yields nothing.
#[must_use]
pub fn split_months(start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut ranges = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let range_end = last_day_of_month(cursor).min(end);
        ranges.push((cursor, range_end));
        match range_end.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    ranges
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Human label for a date range, e.g. `"January 2023 to March-2023"`
#[must_use]
pub fn date_range_label(start: NaiveDate, end: NaiveDate) -> String {
    if start.year() == end.year() && start.month() == end.month() {
        start.format("%B %Y").to_string()
    } else if start.year() == end.year() {
        format!("{} to {}", start.format("%B %Y"), end.format("%B-%Y"))
    } else {
        format!("{} to {}", start.format("%B %Y"), end.format("%B %Y"))
    }
}

/// Parses a `YYYY-MM-DD` range, rejecting an end before the start
pub fn parse_date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate)> {
    let parse = |raw: &str| {
        NaiveDate::parse_from_str(raw.trim(), INPUT_DATE_FORMAT).map_err(|_| Error::InvalidDate {
            value: raw.to_string(),
        })
    };
    let (start, end) = (parse(start)?, parse(end)?);
    if start > end {
        return Err(Error::InvalidDateRange { start, end });
    }
    Ok((start, end))
}

/// Renders an amount with exactly three decimals
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let mut value = tax::to_amount_scale(amount);
    value.rescale(tax::AMOUNT_SCALE);
    value.to_string()
}

/// One line item as it appears in a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// 1-based position within its section
    pub serial: usize,
    pub invoice_id: i64,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub party_name: String,
    /// Empty when the customer has no tax id
    pub party_tax_id: String,
    pub commodity: String,
    pub classification_code: String,
    pub tax_rate: Decimal,
    pub quantity_label: String,
    pub rate_label: String,
    pub taxable_value: Decimal,
    pub origin_tax: Decimal,
    pub destination_tax: Decimal,
    pub cross_tax: Decimal,
    pub amount: Decimal,
    pub direction: Direction,
}

impl ReportRow {
    /// Cell values in [`REPORT_COLUMNS`] order
    #[must_use]
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.serial.to_string(),
            self.invoice_number.clone(),
            self.invoice_date.format(REPORT_DATE_FORMAT).to_string(),
            self.party_name.clone(),
            self.party_tax_id.clone(),
            self.commodity.clone(),
            self.classification_code.clone(),
            tax::format_tax_rate(self.tax_rate),
            self.quantity_label.clone(),
            self.rate_label.clone(),
            format_amount(self.taxable_value),
            format_amount(self.origin_tax),
            format_amount(self.destination_tax),
            format_amount(self.cross_tax),
            format_amount(self.amount),
        ]
    }
}

/// Whether a section covers one month or the whole range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Monthly,
    Aggregate,
}

/// One block of a business's report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub business_id: i64,
    pub business_name: String,
    pub business_tax_id: String,
    pub direction: Direction,
    pub kind: SectionKind,
    /// `"Outward Supply"` or `"Aggregated Outward Supply (<range>)"`
    pub title: String,
    /// Month label for monthly sections, range label for aggregates
    pub label: String,
    /// Empty for aggregate sections
    pub rows: Vec<ReportRow>,
    pub subtotal: TaxTotals,
}

impl ReportSection {
    /// Cells of the totals row: the label under "Commodity", the five sums
    /// under the numeric columns. Monthly sections are labelled
    /// [`SUBTOTAL_LABEL`], aggregates carry their title.
    #[must_use]
    pub fn subtotal_cells(&self) -> Vec<String> {
        let label = match self.kind {
            SectionKind::Monthly => SUBTOTAL_LABEL,
            SectionKind::Aggregate => self.title.as_str(),
        };
        let mut cells = vec![String::new(); SUBTOTAL_LABEL_COLUMN];
        cells.push(label.to_owned());
        cells.resize(FIRST_AMOUNT_COLUMN, String::new());
        cells.extend(
            [
                self.subtotal.taxable_value,
                self.subtotal.origin_tax,
                self.subtotal.destination_tax,
                self.subtotal.cross_tax,
                self.subtotal.amount,
            ]
            .into_iter()
            .map(format_amount),
        );
        cells
    }
}

/// Builds the report for every business, ordered by business id.
///
/// # Errors
/// Fails on an inverted range or a storage error. Businesses without
/// matching rows simply contribute no sections.
pub async fn generate_report<C>(
    db: &C,
    start: NaiveDate,
    end: NaiveDate,
    filter: DirectionFilter,
) -> Result<Vec<ReportSection>>
where
    C: ConnectionTrait,
{
    if start > end {
        return Err(Error::InvalidDateRange { start, end });
    }

    let months = split_months(start, end);
    let range_label = date_range_label(start, end);
    let mut sections = Vec::new();

    for business in get_all_businesses(db).await? {
        let mut aggregates: Vec<(Direction, TaxTotals)> = filter
            .directions()
            .iter()
            .map(|direction| (*direction, TaxTotals::default()))
            .collect();

        for &(month_start, month_end) in &months {
            let rows = fetch_rows(db, &business, month_start, month_end, filter).await?;
            let month_label = month_start.format("%B %Y").to_string();

            for (direction, aggregate) in &mut aggregates {
                let mut section_rows: Vec<ReportRow> = rows
                    .iter()
                    .filter(|row| row.direction == *direction)
                    .cloned()
                    .collect();
                if section_rows.is_empty() {
                    continue;
                }

                let mut subtotal = TaxTotals::default();
                for (index, row) in section_rows.iter_mut().enumerate() {
                    row.serial = index + 1;
                    subtotal.add_row(
                        row.taxable_value,
                        row.origin_tax,
                        row.destination_tax,
                        row.cross_tax,
                        row.amount,
                    )?;
                }
                aggregate.merge(&subtotal)?;

                debug!(
                    business_id = business.id,
                    month = %month_label,
                    direction = %direction,
                    rows = section_rows.len(),
                    "Report section"
                );
                sections.push(ReportSection {
                    business_id: business.id,
                    business_name: business.name.clone(),
                    business_tax_id: business.tax_id.clone(),
                    direction: *direction,
                    kind: SectionKind::Monthly,
                    title: direction.supply_label().to_string(),
                    label: month_label.clone(),
                    rows: section_rows,
                    subtotal,
                });
            }
        }

        for (direction, totals) in aggregates {
            if totals.is_zero() {
                continue;
            }
            sections.push(ReportSection {
                business_id: business.id,
                business_name: business.name.clone(),
                business_tax_id: business.tax_id.clone(),
                direction,
                kind: SectionKind::Aggregate,
                title: format!("Aggregated {} ({range_label})", direction.supply_label()),
                label: range_label.clone(),
                rows: Vec::new(),
                subtotal: totals,
            });
        }
    }

    info!(
        start = %start,
        end = %end,
        sections = sections.len(),
        "Generated report"
    );
    Ok(sections)
}

/// Line-item projection for one business and month, ordered by invoice date,
/// invoice number, then line-item id.
async fn fetch_rows<C>(
    db: &C,
    business: &business::Model,
    start: NaiveDate,
    end: NaiveDate,
    filter: DirectionFilter,
) -> Result<Vec<ReportRow>>
where
    C: ConnectionTrait,
{
    let mut invoices = Vec::new();
    for invoice in Invoice::find()
        .filter(invoice::Column::BusinessId.eq(business.id))
        .filter(invoice::Column::InvoiceDate.between(start, end))
        .order_by_asc(invoice::Column::InvoiceDate)
        .order_by_asc(invoice::Column::InvoiceNumber)
        .order_by_asc(invoice::Column::Id)
        .all(db)
        .await?
    {
        let direction = invoice.direction()?;
        if filter.includes(direction) {
            invoices.push((direction, invoice));
        }
    }
    if invoices.is_empty() {
        return Ok(Vec::new());
    }

    let invoice_ids: Vec<i64> = invoices.iter().map(|(_, i)| i.id).collect();
    let mut items_by_invoice: HashMap<i64, Vec<line_item::Model>> = HashMap::new();
    for item in LineItem::find()
        .filter(line_item::Column::InvoiceId.is_in(invoice_ids))
        .order_by_asc(line_item::Column::Id)
        .all(db)
        .await?
    {
        items_by_invoice.entry(item.invoice_id).or_default().push(item);
    }

    let customer_ids: Vec<i64> = invoices.iter().map(|(_, i)| i.customer_id).collect();
    let customers: HashMap<i64, customer::Model> = Customer::find()
        .filter(customer::Column::Id.is_in(customer_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut rows = Vec::new();
    for (direction, invoice) in invoices {
        let customer = customers.get(&invoice.customer_id);
        let party_name = customer.map(|c| c.name.clone()).unwrap_or_default();
        let party_tax_id = customer.and_then(|c| c.tax_id.clone()).unwrap_or_default();

        for item in items_by_invoice.remove(&invoice.id).unwrap_or_default() {
            let unit = item.unit()?;
            rows.push(ReportRow {
                serial: 0,
                invoice_id: invoice.id,
                invoice_number: invoice.invoice_number.clone(),
                invoice_date: invoice.invoice_date,
                party_name: party_name.clone(),
                party_tax_id: party_tax_id.clone(),
                taxable_value: tax::net_amount(*item.quantity, *item.rate)?,
                quantity_label: unit.quantity_label(*item.quantity),
                rate_label: unit.rate_label(*item.rate),
                commodity: item.product_name,
                classification_code: item.classification_code,
                tax_rate: *item.tax_rate,
                origin_tax: *item.origin_tax,
                destination_tax: *item.destination_tax,
                cross_tax: *item.cross_tax,
                amount: *item.amount,
                direction,
            });
        }
    }
    Ok(rows)
}
