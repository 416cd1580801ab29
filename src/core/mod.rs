/// Issuing businesses
pub mod business;
/// Customers and their business associations
pub mod customer;
/// Invoice direction and report filters
pub mod direction;
/// CSV workbook export of reports
pub mod export;
/// Fiscal year windows
pub mod fiscal;
/// Bulk CSV import of outward invoices
pub mod import;
/// Invoice lifecycle and summaries
pub mod invoice;
/// Jurisdiction tax identifiers
pub mod jurisdiction;
/// Line items with tax split and total recalculation
pub mod line_item;
/// Product catalog
pub mod product;
/// Monthly and aggregate supply reports
pub mod report;
/// Invoice number suggestions
pub mod sequence;
/// Tax split, totals and rounding
pub mod tax;
/// Units of measure
pub mod units;
