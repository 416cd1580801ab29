//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod business;
pub mod customer;
pub mod customer_business;
pub mod decimal;
pub mod invoice;
pub mod line_item;
pub mod product;

// Re-export specific types to avoid conflicts
pub use business::{Column as BusinessColumn, Entity as Business, Model as BusinessModel};
pub use customer::{Column as CustomerColumn, Entity as Customer, Model as CustomerModel};
pub use customer_business::{
    Column as CustomerBusinessColumn, Entity as CustomerBusiness, Model as CustomerBusinessModel,
};
pub use decimal::DecimalText;
pub use invoice::{Column as InvoiceColumn, Entity as Invoice, Model as InvoiceModel};
pub use line_item::{Column as LineItemColumn, Entity as LineItem, Model as LineItemModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
