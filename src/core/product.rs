//! Product business logic - The catalog consulted for line-item defaults.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashMap;

/// Checks that a tax rate is a fraction in [0, 1]
pub fn validate_tax_rate(rate: Decimal) -> Result<Decimal> {
    if rate.is_sign_negative() || rate > Decimal::ONE {
        return Err(Error::InvalidTaxRate { rate });
    }
    Ok(rate)
}

/// Creates a catalog product.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The tax rate is outside [0, 1]
/// - The name is already taken
pub async fn create_product<C>(
    db: &C,
    name: String,
    classification_code: String,
    tax_rate: Decimal,
) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Product name cannot be empty".to_string(),
        });
    }
    let tax_rate = validate_tax_rate(tax_rate)?;

    let now = chrono::Utc::now().naive_utc();
    let product = product::ActiveModel {
        name: Set(name.trim().to_string()),
        classification_code: Set(classification_code.trim().to_string()),
        tax_rate: Set(tax_rate.into()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Finds a product by its exact name
pub async fn get_product_by_name<C>(db: &C, name: &str) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Fetches every product whose name is in `names`, keyed by name
pub async fn get_products_by_names<C>(
    db: &C,
    names: &[String],
) -> Result<HashMap<String, product::Model>>
where
    C: ConnectionTrait,
{
    if names.is_empty() {
        return Ok(HashMap::new());
    }
    let products = Product::find()
        .filter(product::Column::Name.is_in(names.iter().cloned()))
        .all(db)
        .await?;
    Ok(products.into_iter().map(|p| (p.name.clone(), p)).collect())
}

/// The whole catalog ordered by name
pub async fn get_all_products<C>(db: &C) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}
