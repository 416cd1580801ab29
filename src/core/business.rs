//! Business logic for issuing businesses - creation and lookup.

use crate::{
    core::jurisdiction::TaxId,
    entities::{Business, business},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Input for [`create_business`]
#[derive(Debug, Clone, Default)]
pub struct NewBusiness {
    pub name: String,
    pub address: String,
    pub tax_id: String,
    /// Derived from the tax id prefix when `None`
    pub jurisdiction_name: Option<String>,
    pub mobile_number: String,
    pub landline_number: Option<String>,
    pub pan_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_ifsc_code: Option<String>,
    pub bank_branch_name: Option<String>,
}

/// Creates a business after validating its name and tax id.
///
/// The tax id is required: it drives the tax split of every invoice the
/// business raises.
pub async fn create_business<C>(db: &C, new: NewBusiness) -> Result<business::Model>
where
    C: ConnectionTrait,
{
    let name = new.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Business name cannot be empty".to_string(),
        });
    }

    let tax_id = TaxId::new(&new.tax_id);
    if tax_id.is_blank() {
        return Err(Error::Validation {
            message: format!("Business '{name}' requires a tax id"),
        });
    }

    let jurisdiction_name = new
        .jurisdiction_name
        .or_else(|| tax_id.jurisdiction_name().map(str::to_string))
        .unwrap_or_default();

    let now = chrono::Utc::now().naive_utc();
    let business = business::ActiveModel {
        name: Set(name),
        address: Set(new.address),
        tax_id: Set(tax_id.as_str().to_string()),
        jurisdiction_name: Set(jurisdiction_name),
        mobile_number: Set(new.mobile_number),
        landline_number: Set(new.landline_number),
        pan_number: Set(new.pan_number),
        bank_name: Set(new.bank_name),
        bank_account_number: Set(new.bank_account_number),
        bank_ifsc_code: Set(new.bank_ifsc_code),
        bank_branch_name: Set(new.bank_branch_name),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    business.insert(db).await.map_err(Into::into)
}

/// Finds a business by id
pub async fn get_business_by_id<C>(db: &C, business_id: i64) -> Result<Option<business::Model>>
where
    C: ConnectionTrait,
{
    Business::find_by_id(business_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a business by id, failing with [`Error::BusinessNotFound`] when absent
pub async fn require_business<C>(db: &C, business_id: i64) -> Result<business::Model>
where
    C: ConnectionTrait,
{
    get_business_by_id(db, business_id)
        .await?
        .ok_or(Error::BusinessNotFound { id: business_id })
}

/// All businesses in creation order
pub async fn get_all_businesses<C>(db: &C) -> Result<Vec<business::Model>>
where
    C: ConnectionTrait,
{
    Business::find()
        .order_by_asc(business::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

impl business::Model {
    /// The business's tax id as an opaque identifier
    #[must_use]
    pub fn tax_id(&self) -> TaxId {
        TaxId::new(&self.tax_id)
    }
}
