//! Invoice entity - One sales (outward) or purchase (inward) invoice.
//!
//! `total_amount` is derived from the line items and is only ever written by
//! [`crate::core::invoice::recalculate_invoice_total`].

use super::decimal::DecimalText;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Unique identifier for the invoice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Issuing business
    pub business_id: i64,
    /// Counterparty
    pub customer_id: i64,
    /// Free-form invoice number, unique per business, direction and fiscal year by convention
    pub invoice_number: String,
    /// Date the invoice was raised
    pub invoice_date: Date,
    /// `"outward"` or `"inward"`
    pub direction: String,
    /// Decided once at creation from the business and customer tax ids
    pub is_cross_jurisdiction: bool,
    /// Exact sum of the line item amounts
    #[sea_orm(column_type = "Text")]
    pub total_amount: DecimalText,
    /// When the invoice was created
    pub created_at: DateTime,
    /// When the invoice was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Invoice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each invoice is issued by one business
    #[sea_orm(
        belongs_to = "super::business::Entity",
        from = "Column::BusinessId",
        to = "super::business::Column::Id",
        on_delete = "Cascade"
    )]
    Business,
    /// Each invoice names one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_delete = "Cascade"
    )]
    Customer,
    /// One invoice owns many line items
    #[sea_orm(has_many = "super::line_item::Entity")]
    LineItems,
}

impl Related<super::business::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Business.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
