//! Business entity - The issuing party of every invoice.
//!
//! The `tax_id` prefix decides the tax split for every invoice the business raises.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Business database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "businesses")]
pub struct Model {
    /// Unique identifier for the business
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Trading name, unique across businesses
    #[sea_orm(unique)]
    pub name: String,
    /// Postal address
    pub address: String,
    /// Jurisdiction tax identifier; the first two characters encode the jurisdiction
    pub tax_id: String,
    /// Human-readable jurisdiction name
    pub jurisdiction_name: String,
    /// Mobile phone number
    pub mobile_number: String,
    pub landline_number: Option<String>,
    pub pan_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_ifsc_code: Option<String>,
    pub bank_branch_name: Option<String>,
    /// When the business was created
    pub created_at: DateTime,
    /// When the business was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Business and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One business issues many invoices
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
    /// Association rows linking the business to its customers
    #[sea_orm(has_many = "super::customer_business::Entity")]
    CustomerBusinesses,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl Related<super::customer_business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerBusinesses.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        super::customer_business::Relation::Customer.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::customer_business::Relation::Business.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
