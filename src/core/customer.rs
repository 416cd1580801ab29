//! Customer business logic - counterparties and their links to businesses.
//!
//! A customer can trade with several businesses. Lookups used by invoice
//! creation and the bulk import are always scoped to one business.

use crate::{
    core::{business::require_business, jurisdiction::TaxId},
    entities::{Customer, CustomerBusiness, customer, customer_business},
    errors::{Error, Result},
};
use sea_orm::{
    JoinType, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait, prelude::*,
};
use std::collections::HashMap;

/// Input for [`create_customer`]
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    /// Derived from the tax id prefix when `None`
    pub jurisdiction_name: Option<String>,
    pub pan_number: Option<String>,
    pub mobile_number: Option<String>,
    /// Businesses the customer trades with
    pub business_ids: Vec<i64>,
}

/// Creates a customer and links it to every business in `business_ids`.
///
/// The insert and the links commit together; an unknown business leaves
/// nothing behind.
pub async fn create_customer(
    db: &DatabaseConnection,
    new: NewCustomer,
) -> Result<customer::Model> {
    let name = new.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Customer name cannot be empty".to_string(),
        });
    }

    let tax_id = TaxId::from_optional(new.tax_id.as_deref());
    let jurisdiction_name = new.jurisdiction_name.or_else(|| {
        tax_id
            .as_ref()
            .and_then(TaxId::jurisdiction_name)
            .map(str::to_string)
    });

    let txn = db.begin().await?;
    let now = chrono::Utc::now().naive_utc();
    let customer = customer::ActiveModel {
        name: Set(name),
        address: Set(new.address),
        tax_id: Set(tax_id.map(|id| id.as_str().to_string())),
        jurisdiction_name: Set(jurisdiction_name),
        pan_number: Set(new.pan_number),
        mobile_number: Set(new.mobile_number),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for business_id in new.business_ids {
        require_business(&txn, business_id).await?;
        link_customer_to_business(&txn, customer.id, business_id).await?;
    }

    txn.commit().await?;
    Ok(customer)
}

/// Associates an existing customer with a business; linking twice is a no-op.
pub async fn link_customer_to_business<C>(db: &C, customer_id: i64, business_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = CustomerBusiness::find_by_id((customer_id, business_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    customer_business::ActiveModel {
        customer_id: Set(customer_id),
        business_id: Set(business_id),
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Finds a customer by id
pub async fn get_customer_by_id<C>(db: &C, customer_id: i64) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find_by_id(customer_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a customer by id, failing with [`Error::CustomerNotFound`] when absent
pub async fn require_customer<C>(db: &C, customer_id: i64) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    get_customer_by_id(db, customer_id)
        .await?
        .ok_or(Error::CustomerNotFound { id: customer_id })
}

/// Customers associated with a business, ordered by name
pub async fn get_customers_for_business<C>(db: &C, business_id: i64) -> Result<Vec<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find()
        .join(JoinType::InnerJoin, customer::Relation::CustomerBusinesses.def())
        .filter(customer_business::Column::BusinessId.eq(business_id))
        .order_by_asc(customer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Resolves `names` against the business's customers in one query.
///
/// Names without a match are simply absent from the returned map.
pub async fn find_customers_by_names<C>(
    db: &C,
    business_id: i64,
    names: &[String],
) -> Result<HashMap<String, customer::Model>>
where
    C: ConnectionTrait,
{
    if names.is_empty() {
        return Ok(HashMap::new());
    }

    let customers = Customer::find()
        .join(JoinType::InnerJoin, customer::Relation::CustomerBusinesses.def())
        .filter(customer_business::Column::BusinessId.eq(business_id))
        .filter(customer::Column::Name.is_in(names.iter().cloned()))
        .all(db)
        .await?;

    Ok(customers.into_iter().map(|c| (c.name.clone(), c)).collect())
}

impl customer::Model {
    /// The customer's tax id, `None` when absent or blank
    #[must_use]
    pub fn tax_id(&self) -> Option<TaxId> {
        TaxId::from_optional(self.tax_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_customer_links_businesses() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_business(&db, "First", "27AAA").await?;
        let second = create_test_business(&db, "Second", "33BBB").await?;

        let customer = create_customer(
            &db,
            NewCustomer {
                name: "Shared Customer".to_string(),
                tax_id: Some("33CCC".to_string()),
                business_ids: vec![first.id, second.id],
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(customer.jurisdiction_name.as_deref(), Some("TAMIL NADU"));
        assert_eq!(get_customers_for_business(&db, first.id).await?.len(), 1);
        assert_eq!(get_customers_for_business(&db, second.id).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_customer_unknown_business_rolls_back() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_business(&db, "First", "27AAA").await?;

        let result = create_customer(
            &db,
            NewCustomer {
                name: "Orphan".to_string(),
                business_ids: vec![first.id, 999],
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result, Err(Error::BusinessNotFound { id: 999 })));
        assert!(Customer::find().all(&db).await?.is_empty());
        assert!(CustomerBusiness::find().all(&db).await?.is_empty());
        assert!(get_customers_for_business(&db, first.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_customer_without_tax_id() -> Result<()> {
        let db = setup_test_db().await?;
        let business = create_test_business(&db, "Biz", "27AAA").await?;
        let customer = create_test_customer(&db, "Walk-in", None, business.id).await?;

        assert!(customer.tax_id().is_none());
        assert!(customer.jurisdiction_name.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_link_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let business = create_test_business(&db, "Biz", "27AAA").await?;
        let customer = create_test_customer(&db, "Cust", Some("27BBB"), business.id).await?;

        link_customer_to_business(&db, customer.id, business.id).await?;
        assert_eq!(get_customers_for_business(&db, business.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_find_customers_by_names_is_scoped_to_business() -> Result<()> {
        let db = setup_test_db().await?;
        let mine = create_test_business(&db, "Mine", "27AAA").await?;
        let other = create_test_business(&db, "Other", "27BBB").await?;
        create_test_customer(&db, "Known", Some("27CCC"), mine.id).await?;
        create_test_customer(&db, "Elsewhere", Some("27DDD"), other.id).await?;

        let names = vec![
            "Known".to_string(),
            "Elsewhere".to_string(),
            "Nobody".to_string(),
        ];
        let found = find_customers_by_names(&db, mine.id, &names).await?;

        assert_eq!(found.len(), 1);
        assert!(found.contains_key("Known"));
        Ok(())
    }

    #[tokio::test]
    async fn test_require_customer_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = require_customer(&db, 7).await;
        assert!(matches!(result, Err(Error::CustomerNotFound { id: 7 })));
        Ok(())
    }
}
