//! Product entity - Catalog defaults for line items.
//!
//! A product is only consulted when a line item arrives without an explicit
//! classification code or tax rate.

use super::decimal::DecimalText;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product name, unique across the catalog (e.g., "Gold Ring")
    #[sea_orm(unique)]
    pub name: String,
    /// Default commodity classification code
    pub classification_code: String,
    /// Default tax rate as a fraction in [0, 1]
    #[sea_orm(column_type = "Text")]
    pub tax_rate: DecimalText,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

/// Products are looked up by name and have no foreign keys
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
