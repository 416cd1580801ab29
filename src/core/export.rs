//! CSV workbook export of report sections, one sheet per business.

use crate::{
    core::report::{REPORT_COLUMNS, ReportSection, SectionKind, date_range_label},
    errors::Result,
};
use chrono::NaiveDate;
use std::io::Write;

/// Longest sheet name spreadsheet tools accept
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Empty cells placed before every title line
const TITLE_INDENT: usize = 5;

/// File name for a report over `[start, end]`
#[must_use]
pub fn report_file_name(start: NaiveDate, end: NaiveDate) -> String {
    format!("invoices_{}.csv", date_range_label(start, end))
}

/// Business name truncated to [`MAX_SHEET_NAME_LEN`] characters
#[must_use]
pub fn sheet_name(business_name: &str) -> String {
    business_name.chars().take(MAX_SHEET_NAME_LEN).collect()
}

fn title_row(text: &str) -> Vec<String> {
    let mut row = vec![String::new(); TITLE_INDENT];
    row.push(text.to_string());
    row
}

/// Writes one business's sections as a spreadsheet-shaped CSV.
///
/// A monthly section is: business name, title, month and tax id lines, a
/// blank row, the column header, data rows and the "Grand Total" row.
/// Aggregates follow as one totals row each, set off by blank rows.
pub fn write_business_sheet<W: Write>(writer: W, sections: &[ReportSection]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    let mut wrote_aggregate = false;
    for section in sections {
        match section.kind {
            SectionKind::Monthly => {
                csv.write_record(title_row(&section.business_name))?;
                csv.write_record(title_row(&section.title))?;
                csv.write_record(title_row(&format!("Month: {}", section.label)))?;
                csv.write_record(title_row(&format!("Tax ID: {}", section.business_tax_id)))?;
                csv.write_record([""])?;

                csv.write_record(REPORT_COLUMNS)?;
                for row in &section.rows {
                    csv.write_record(row.cells())?;
                }
                csv.write_record(section.subtotal_cells())?;
            }
            SectionKind::Aggregate => {
                if !wrote_aggregate {
                    csv.write_record([""])?;
                    wrote_aggregate = true;
                }
                csv.write_record(section.subtotal_cells())?;
            }
        }
    }
    if wrote_aggregate {
        csv.write_record([""])?;
    }

    csv.flush()?;
    Ok(())
}
