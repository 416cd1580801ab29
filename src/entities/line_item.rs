//! Line item entity - One priced row of an invoice with its tax split.
//!
//! Exactly one tax path is non-zero per row: either `origin_tax` and
//! `destination_tax` (same jurisdiction) or `cross_tax` (cross jurisdiction).

use super::decimal::DecimalText;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Line item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "line_items")]
pub struct Model {
    /// Unique identifier for the line item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning invoice
    pub invoice_id: i64,
    /// Customer copied from the owning invoice
    pub customer_id: i64,
    pub product_name: String,
    pub classification_code: String,
    /// Tax rate as a fraction in [0, 1]
    #[sea_orm(column_type = "Text")]
    pub tax_rate: DecimalText,
    #[sea_orm(column_type = "Text")]
    pub quantity: DecimalText,
    /// Unit of the quantity: `"gm"`, `"kg"` or `"pcs"`
    pub unit: String,
    /// Price per unit
    #[sea_orm(column_type = "Text")]
    pub rate: DecimalText,
    #[sea_orm(column_type = "Text")]
    pub origin_tax: DecimalText,
    #[sea_orm(column_type = "Text")]
    pub destination_tax: DecimalText,
    #[sea_orm(column_type = "Text")]
    pub cross_tax: DecimalText,
    /// quantity x rate plus whichever tax path applied
    #[sea_orm(column_type = "Text")]
    pub amount: DecimalText,
    /// When the line item was created
    pub created_at: DateTime,
    /// When the line item was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between LineItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line item belongs to one invoice and is deleted with it
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id",
        on_delete = "Cascade"
    )]
    Invoice,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
