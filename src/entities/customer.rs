//! Customer entity - The counterparty of an invoice.
//!
//! Customers are shared between businesses through `customer_businesses`.
//! A customer without a `tax_id` is always treated as same-jurisdiction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer name, unique across customers
    #[sea_orm(unique)]
    pub name: String,
    pub address: Option<String>,
    /// Optional jurisdiction tax identifier
    pub tax_id: Option<String>,
    pub jurisdiction_name: Option<String>,
    pub pan_number: Option<String>,
    pub mobile_number: Option<String>,
    /// When the customer was created
    pub created_at: DateTime,
    /// When the customer was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Customer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One customer appears on many invoices
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
    /// Association rows linking the customer to businesses
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

impl Related<super::business::Entity> for Entity {
    fn to() -> RelationDef {
        super::customer_business::Relation::Business.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::customer_business::Relation::Customer.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
