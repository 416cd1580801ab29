//! Line item business logic - Priced invoice rows and their tax split.
//!
//! Each mutation validates its input, resolves missing classification code,
//! tax rate and unit (explicit value, then product catalog, then settings),
//! applies the invoice's tax path and recomputes the invoice total, all in
//! one database transaction.

use crate::{
    config::settings::LineItemDefaults,
    core::{
        invoice::{recalculate_invoice_total, require_invoice},
        product::{get_product_by_name, validate_tax_rate},
        tax::{self, TaxSplit},
        units::Unit,
    },
    entities::{LineItem, invoice, line_item, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{IntoActiveModel, QueryOrder, Set, TransactionTrait, prelude::*};

/// Caller-supplied values for a line item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItemInput {
    pub product_name: String,
    /// Falls back to the product catalog, then settings
    pub classification_code: Option<String>,
    /// Fraction in [0, 1]; falls back to the product catalog, then settings
    pub tax_rate: Option<Decimal>,
    pub quantity: Decimal,
    /// Price per unit
    pub rate: Decimal,
    /// Falls back to settings
    pub unit: Option<Unit>,
}

impl LineItemInput {
    /// Rejects blank product names, negative amounts and out-of-range tax rates
    pub fn validate(&self) -> Result<()> {
        if self.product_name.trim().is_empty() {
            return Err(Error::Validation {
                message: "Product name cannot be empty".to_string(),
            });
        }
        if self.quantity.is_sign_negative() && !self.quantity.is_zero() {
            return Err(Error::InvalidAmount {
                field: "quantity",
                amount: self.quantity,
            });
        }
        if self.rate.is_sign_negative() && !self.rate.is_zero() {
            return Err(Error::InvalidAmount {
                field: "rate",
                amount: self.rate,
            });
        }
        if let Some(rate) = self.tax_rate {
            validate_tax_rate(rate)?;
        }
        Ok(())
    }

    fn needs_catalog(&self) -> bool {
        self.classification_code.is_none() || self.tax_rate.is_none()
    }
}

/// Fully resolved and computed values ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
struct PricedLine {
    product_name: String,
    classification_code: String,
    tax_rate: Decimal,
    quantity: Decimal,
    unit: Unit,
    rate: Decimal,
    split: TaxSplit,
}

fn price_line(
    input: LineItemInput,
    product: Option<&product::Model>,
    is_cross_jurisdiction: bool,
    defaults: &LineItemDefaults,
) -> Result<PricedLine> {
    input.validate()?;

    let classification_code = tax::resolve_defaults(
        input.classification_code.filter(|code| !code.trim().is_empty()),
        || product.map(|p| p.classification_code.clone()),
        defaults.classification_code.clone(),
    );
    let tax_rate = validate_tax_rate(tax::resolve_defaults(
        input.tax_rate,
        || product.map(|p| *p.tax_rate),
        defaults.tax_rate,
    ))?;
    let unit = input.unit.unwrap_or(defaults.unit);

    let net = tax::net_amount(input.quantity, input.rate)?;
    let split = tax::compute_line_item(net, tax_rate, is_cross_jurisdiction)?;

    Ok(PricedLine {
        product_name: input.product_name.trim().to_string(),
        classification_code,
        tax_rate,
        quantity: input.quantity,
        unit,
        rate: input.rate,
        split,
    })
}

/// Inserts a line item for `invoice` without touching the invoice total.
///
/// `product` is the catalog entry for the row's product name, if any. Used by
/// [`create_line_item`] and the bulk import, which recompute totals themselves.
pub async fn insert_line_item<C>(
    conn: &C,
    invoice: &invoice::Model,
    input: LineItemInput,
    product: Option<&product::Model>,
    defaults: &LineItemDefaults,
) -> Result<line_item::Model>
where
    C: ConnectionTrait,
{
    let priced = price_line(input, product, invoice.is_cross_jurisdiction, defaults)?;

    let now = chrono::Utc::now().naive_utc();
    line_item::ActiveModel {
        invoice_id: Set(invoice.id),
        customer_id: Set(invoice.customer_id),
        product_name: Set(priced.product_name),
        classification_code: Set(priced.classification_code),
        tax_rate: Set(priced.tax_rate.into()),
        quantity: Set(priced.quantity.into()),
        unit: Set(priced.unit.as_str().to_string()),
        rate: Set(priced.rate.into()),
        origin_tax: Set(priced.split.origin_tax.into()),
        destination_tax: Set(priced.split.destination_tax.into()),
        cross_tax: Set(priced.split.cross_tax.into()),
        amount: Set(priced.split.total.into()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(Into::into)
}

async fn catalog_entry<C>(conn: &C, input: &LineItemInput) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    if input.needs_catalog() {
        get_product_by_name(conn, input.product_name.trim()).await
    } else {
        Ok(None)
    }
}

/// Adds a line item to an invoice and updates the invoice total.
pub async fn create_line_item(
    db: &DatabaseConnection,
    invoice_id: i64,
    input: LineItemInput,
    defaults: &LineItemDefaults,
) -> Result<line_item::Model> {
    let txn = db.begin().await?;

    let invoice = require_invoice(&txn, invoice_id).await?;
    let product = catalog_entry(&txn, &input).await?;
    let item = insert_line_item(&txn, &invoice, input, product.as_ref(), defaults).await?;
    recalculate_invoice_total(&txn, invoice_id).await?;

    txn.commit().await?;
    Ok(item)
}

/// Replaces a line item's values, re-running the tax split with the
/// invoice's stored cross-jurisdiction flag.
pub async fn update_line_item(
    db: &DatabaseConnection,
    line_item_id: i64,
    input: LineItemInput,
    defaults: &LineItemDefaults,
) -> Result<line_item::Model> {
    let txn = db.begin().await?;

    let existing = LineItem::find_by_id(line_item_id)
        .one(&txn)
        .await?
        .ok_or(Error::LineItemNotFound { id: line_item_id })?;
    let invoice = require_invoice(&txn, existing.invoice_id).await?;
    let product = catalog_entry(&txn, &input).await?;
    let priced = price_line(
        input,
        product.as_ref(),
        invoice.is_cross_jurisdiction,
        defaults,
    )?;

    let mut active = existing.into_active_model();
    active.product_name = Set(priced.product_name);
    active.classification_code = Set(priced.classification_code);
    active.tax_rate = Set(priced.tax_rate.into());
    active.quantity = Set(priced.quantity.into());
    active.unit = Set(priced.unit.as_str().to_string());
    active.rate = Set(priced.rate.into());
    active.origin_tax = Set(priced.split.origin_tax.into());
    active.destination_tax = Set(priced.split.destination_tax.into());
    active.cross_tax = Set(priced.split.cross_tax.into());
    active.amount = Set(priced.split.total.into());
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    let updated = active.update(&txn).await?;

    recalculate_invoice_total(&txn, invoice.id).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Removes a line item and updates the invoice total.
pub async fn delete_line_item(db: &DatabaseConnection, line_item_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let existing = LineItem::find_by_id(line_item_id)
        .one(&txn)
        .await?
        .ok_or(Error::LineItemNotFound { id: line_item_id })?;
    let invoice_id = existing.invoice_id;
    existing.delete(&txn).await?;
    recalculate_invoice_total(&txn, invoice_id).await?;

    txn.commit().await?;
    Ok(())
}

/// Line items of an invoice in insertion order
pub async fn get_line_items_for_invoice<C>(db: &C, invoice_id: i64) -> Result<Vec<line_item::Model>>
where
    C: ConnectionTrait,
{
    LineItem::find()
        .filter(line_item::Column::InvoiceId.eq(invoice_id))
        .order_by_asc(line_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

impl line_item::Model {
    /// Parsed unit of the quantity
    pub fn unit(&self) -> Result<Unit> {
        self.unit.parse()
    }

    /// Quantity in grams; `None` for counted units
    pub fn quantity_in_grams(&self) -> Result<Option<Decimal>> {
        Ok(self.unit()?.quantity_in_grams(*self.quantity))
    }

    /// Price per gram; `None` for counted units
    pub fn rate_per_gram(&self) -> Result<Option<Decimal>> {
        Ok(self.unit()?.rate_per_gram(*self.rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::invoice::get_invoice_by_id;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    async fn invoice_total(db: &DatabaseConnection, invoice_id: i64) -> Result<Decimal> {
        Ok(*require_invoice(db, invoice_id).await?.total_amount)
    }

    #[tokio::test]
    async fn test_create_line_item_same_jurisdiction() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", Some("27BBB")).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;

        let item = create_line_item(
            &db,
            invoice.id,
            test_line_item("Ring", dec!(2), dec!(500), dec!(0.18)),
            &LineItemDefaults::default(),
        )
        .await?;

        assert_eq!(item.customer_id, customer.id);
        assert_eq!(item.origin_tax, dec!(90));
        assert_eq!(item.destination_tax, dec!(90));
        assert_eq!(item.cross_tax, dec!(0));
        assert_eq!(item.amount, dec!(1180));
        assert_eq!(invoice_total(&db, invoice.id).await?, dec!(1180));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_line_item_cross_jurisdiction() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", Some("33BBB")).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;

        let item = create_line_item(
            &db,
            invoice.id,
            test_line_item("Chain", dec!(10.5), dec!(4500), dec!(0.03)),
            &LineItemDefaults::default(),
        )
        .await?;

        assert_eq!(item.origin_tax, dec!(0));
        assert_eq!(item.destination_tax, dec!(0));
        assert_eq!(item.cross_tax, dec!(1417.5));
        assert_eq!(item.amount, dec!(48667.5));
        assert_eq!(item.unit()?, Unit::Gram);
        Ok(())
    }

    #[tokio::test]
    async fn test_large_amounts_read_back_exactly() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", None).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;
        let defaults = LineItemDefaults::default();

        create_line_item(
            &db,
            invoice.id,
            test_line_item("Bar", dec!(1), dec!(8999999999999.999), dec!(0)),
            &defaults,
        )
        .await?;
        create_line_item(
            &db,
            invoice.id,
            test_line_item("Coin", dec!(1), dec!(9007199254740.993), dec!(0)),
            &defaults,
        )
        .await?;

        let items = get_line_items_for_invoice(&db, invoice.id).await?;
        assert_eq!(items[0].rate, dec!(8999999999999.999));
        assert_eq!(items[0].amount, dec!(8999999999999.999));
        assert_eq!(items[1].rate, dec!(9007199254740.993));
        assert_eq!(items[1].amount, dec!(9007199254740.993));
        assert_eq!(
            invoice_total(&db, invoice.id).await?,
            dec!(18007199254740.992)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_gram_normalisation_of_stored_items() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", None).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;
        let defaults = LineItemDefaults::default();

        let bar = create_line_item(
            &db,
            invoice.id,
            LineItemInput {
                unit: Some(Unit::Kilogram),
                ..test_line_item("Bar", dec!(1.5), dec!(60000), dec!(0.03))
            },
            &defaults,
        )
        .await?;
        assert_eq!(bar.quantity_in_grams()?, Some(dec!(1500)));
        assert_eq!(bar.rate_per_gram()?, Some(dec!(60)));

        let coin = create_line_item(
            &db,
            invoice.id,
            LineItemInput {
                unit: Some(Unit::Piece),
                ..test_line_item("Coin", dec!(2), dec!(100), dec!(0.03))
            },
            &defaults,
        )
        .await?;
        assert_eq!(coin.quantity_in_grams()?, None);
        assert_eq!(coin.rate_per_gram()?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_defaults_resolution_tiers() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", None).await?;
        create_test_product(&db, "Coin", dec!(0.25)).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;
        let defaults = LineItemDefaults::default();

        let from_catalog = create_line_item(
            &db,
            invoice.id,
            LineItemInput {
                product_name: "Coin".to_string(),
                quantity: dec!(1),
                rate: dec!(100),
                ..Default::default()
            },
            &defaults,
        )
        .await?;
        assert_eq!(from_catalog.tax_rate, dec!(0.25));
        assert_eq!(from_catalog.classification_code, "7118");

        let from_settings = create_line_item(
            &db,
            invoice.id,
            LineItemInput {
                product_name: "Unlisted".to_string(),
                quantity: dec!(1),
                rate: dec!(100),
                unit: Some(Unit::Piece),
                ..Default::default()
            },
            &defaults,
        )
        .await?;
        assert_eq!(from_settings.tax_rate, dec!(0.03));
        assert_eq!(from_settings.classification_code, "711319");
        assert_eq!(from_settings.unit, "pcs");

        let explicit = create_line_item(
            &db,
            invoice.id,
            LineItemInput {
                product_name: "Coin".to_string(),
                classification_code: Some("9999".to_string()),
                tax_rate: Some(dec!(0.5)),
                quantity: dec!(1),
                rate: dec!(100),
                ..Default::default()
            },
            &defaults,
        )
        .await?;
        assert_eq!(explicit.tax_rate, dec!(0.5));
        assert_eq!(explicit.classification_code, "9999");
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_without_side_effects() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", None).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;
        let defaults = LineItemDefaults::default();

        let negative = create_line_item(
            &db,
            invoice.id,
            test_line_item("Ring", dec!(-1), dec!(100), dec!(0.03)),
            &defaults,
        )
        .await;
        assert!(matches!(
            negative,
            Err(Error::InvalidAmount {
                field: "quantity",
                ..
            })
        ));

        let bad_rate = create_line_item(
            &db,
            invoice.id,
            test_line_item("Ring", dec!(1), dec!(100), dec!(1.5)),
            &defaults,
        )
        .await;
        assert!(matches!(bad_rate, Err(Error::InvalidTaxRate { .. })));

        let missing_invoice = create_line_item(
            &db,
            999,
            test_line_item("Ring", dec!(1), dec!(100), dec!(0.03)),
            &defaults,
        )
        .await;
        assert!(matches!(
            missing_invoice,
            Err(Error::InvoiceNotFound { id: 999 })
        ));

        assert!(get_line_items_for_invoice(&db, invoice.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_total_tracks_every_mutation() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", Some("27BBB")).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;
        let defaults = LineItemDefaults::default();

        let first = create_line_item(
            &db,
            invoice.id,
            test_line_item("Ring", dec!(2), dec!(500), dec!(0.18)),
            &defaults,
        )
        .await?;
        let second = create_line_item(
            &db,
            invoice.id,
            test_line_item("Coin", dec!(1), dec!(250), dec!(0)),
            &defaults,
        )
        .await?;
        assert_eq!(invoice_total(&db, invoice.id).await?, dec!(1430));

        let updated = update_line_item(
            &db,
            first.id,
            test_line_item("Ring", dec!(4), dec!(500), dec!(0.18)),
            &defaults,
        )
        .await?;
        assert_eq!(updated.amount, dec!(2360));
        assert_eq!(invoice_total(&db, invoice.id).await?, dec!(2610));

        delete_line_item(&db, second.id).await?;
        assert_eq!(invoice_total(&db, invoice.id).await?, dec!(2360));

        delete_line_item(&db, first.id).await?;
        let invoice = get_invoice_by_id(&db, invoice.id).await?;
        assert_eq!(invoice.map(|i| *i.total_amount), Some(dec!(0)));

        let missing = delete_line_item(&db, first.id).await;
        assert!(matches!(missing, Err(Error::LineItemNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_line_items_in_insertion_order() -> Result<()> {
        let (db, business, customer) = setup_with_parties("27AAA", None).await?;
        let invoice = create_test_invoice(&db, business.id, customer.id, "1", "2023-06-01").await?;
        let defaults = LineItemDefaults::default();
        for name in ["B", "A", "C"] {
            create_line_item(
                &db,
                invoice.id,
                test_line_item(name, dec!(1), dec!(1), dec!(0)),
                &defaults,
            )
            .await?;
        }

        let names: Vec<String> = get_line_items_for_invoice(&db, invoice.id)
            .await?
            .into_iter()
            .map(|item| item.product_name)
            .collect();
        assert_eq!(names, vec!["B", "A", "C"]);
        Ok(())
    }
}
