//! Tax split computation, aggregation and presentation rounding.
//!
//! Every amount is an exact `Decimal` kept at [`AMOUNT_SCALE`] fractional
//! digits. A line item pays either the origin/destination pair (each half of
//! the tax) when both parties share a jurisdiction, or the single
//! cross-jurisdiction tax when they do not. Nothing here touches storage.

use crate::core::jurisdiction::TaxId;
use crate::errors::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;

/// Fractional digits kept on every stored amount
pub const AMOUNT_SCALE: u32 = 3;

/// Result of splitting the tax on one net amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxSplit {
    /// Origin-jurisdiction half (zero for cross-jurisdiction)
    pub origin_tax: Decimal,
    /// Destination-jurisdiction half (zero for cross-jurisdiction)
    pub destination_tax: Decimal,
    /// Single cross-jurisdiction tax (zero within a jurisdiction)
    pub cross_tax: Decimal,
    /// Net amount plus every tax component
    pub total: Decimal,
}

/// Rounds to [`AMOUNT_SCALE`] digits, half away from zero
#[must_use]
pub fn to_amount_scale(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Pre-tax amount of a line: quantity x rate at amount scale
///
/// # Errors
/// Returns [`Error::Overflow`] if the product does not fit a `Decimal`.
pub fn net_amount(quantity: Decimal, rate: Decimal) -> Result<Decimal> {
    quantity
        .checked_mul(rate)
        .map(to_amount_scale)
        .ok_or(Error::Overflow {
            operation: "net amount",
        })
}

/// Splits the tax on `net_amount` at `tax_rate`.
///
/// Inputs are trusted: quantities, rates and tax rates are validated by the
/// line-item constructor before this runs.
///
/// # Errors
/// Returns [`Error::Overflow`] on arithmetic overflow.
pub fn compute_line_item(
    net_amount: Decimal,
    tax_rate: Decimal,
    is_cross_jurisdiction: bool,
) -> Result<TaxSplit> {
    let overflow = |operation| Error::Overflow { operation };
    let tax = net_amount
        .checked_mul(tax_rate)
        .ok_or_else(|| overflow("tax amount"))?;

    let (origin_tax, destination_tax, cross_tax) = if is_cross_jurisdiction {
        (Decimal::ZERO, Decimal::ZERO, to_amount_scale(tax))
    } else {
        let half = tax
            .checked_div(dec!(2))
            .map(to_amount_scale)
            .ok_or_else(|| overflow("tax half"))?;
        (half, half, Decimal::ZERO)
    };

    let total = [origin_tax, destination_tax, cross_tax]
        .into_iter()
        .try_fold(net_amount, Decimal::checked_add)
        .ok_or_else(|| overflow("line total"))?;

    Ok(TaxSplit {
        origin_tax,
        destination_tax,
        cross_tax,
        total,
    })
}

/// Whether an invoice between these parties crosses jurisdictions.
///
/// A customer without a tax id is always same-jurisdiction. Otherwise the
/// two-character prefixes are compared.
#[must_use]
pub fn is_cross_jurisdiction(business_tax_id: &TaxId, customer_tax_id: Option<&TaxId>) -> bool {
    let Some(customer) = customer_tax_id.filter(|id| !id.is_blank()) else {
        return false;
    };
    let prefix = |id: &TaxId| -> String { id.as_str().chars().take(2).collect() };
    prefix(customer) != prefix(business_tax_id)
}

/// First present value of: the explicit input, the catalog lookup, the fallback.
///
/// The lookup only runs when no explicit value was given.
pub fn resolve_defaults<T, F>(explicit: Option<T>, product_lookup: F, fallback: T) -> T
where
    F: FnOnce() -> Option<T>,
{
    explicit.or_else(product_lookup).unwrap_or(fallback)
}

/// Rounds to a whole number: fractions below one half go down, the rest go up.
#[must_use]
pub fn custom_round(amount: Decimal) -> Decimal {
    let floor = amount.floor();
    if amount - floor >= dec!(0.5) {
        floor + Decimal::ONE
    } else {
        floor
    }
}

/// Presentation rounding of an invoice total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundOff {
    /// Exact sum of the line amounts (what is persisted)
    pub exact: Decimal,
    /// Whole-number total shown on a printed invoice
    pub rounded: Decimal,
    /// `rounded - exact`
    pub adjustment: Decimal,
}

impl RoundOff {
    /// Signed adjustment with two decimals, e.g. `"-0.37"` or `"+0.63"`
    #[must_use]
    pub fn display(&self) -> String {
        let mut adjustment = self
            .adjustment
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        adjustment.rescale(2);
        if adjustment.is_sign_negative() && !adjustment.is_zero() {
            adjustment.to_string()
        } else {
            format!("+{}", adjustment.abs())
        }
    }
}

/// Rounds `exact` for display and reports the reconciling adjustment
#[must_use]
pub fn round_off(exact: Decimal) -> RoundOff {
    let rounded = custom_round(exact);
    RoundOff {
        exact,
        rounded,
        adjustment: rounded - exact,
    }
}

/// Running sums over the five numeric columns of an invoice or report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaxTotals {
    /// Sum of pre-tax amounts
    pub taxable_value: Decimal,
    pub origin_tax: Decimal,
    pub destination_tax: Decimal,
    pub cross_tax: Decimal,
    /// Sum of final amounts
    pub amount: Decimal,
}

impl TaxTotals {
    /// Adds one row's values
    ///
    /// # Errors
    /// Returns [`Error::Overflow`] if any sum overflows.
    pub fn add_row(
        &mut self,
        taxable_value: Decimal,
        origin_tax: Decimal,
        destination_tax: Decimal,
        cross_tax: Decimal,
        amount: Decimal,
    ) -> Result<()> {
        let add = |a: Decimal, b: Decimal| {
            a.checked_add(b).ok_or(Error::Overflow {
                operation: "running total",
            })
        };
        self.taxable_value = add(self.taxable_value, taxable_value)?;
        self.origin_tax = add(self.origin_tax, origin_tax)?;
        self.destination_tax = add(self.destination_tax, destination_tax)?;
        self.cross_tax = add(self.cross_tax, cross_tax)?;
        self.amount = add(self.amount, amount)?;
        Ok(())
    }

    /// Adds another set of totals
    ///
    /// # Errors
    /// Returns [`Error::Overflow`] if any sum overflows.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        self.add_row(
            other.taxable_value,
            other.origin_tax,
            other.destination_tax,
            other.cross_tax,
            other.amount,
        )
    }

    /// Sum of all tax components
    ///
    /// # Errors
    /// Returns [`Error::Overflow`] if the sum overflows.
    pub fn total_tax(&self) -> Result<Decimal> {
        self.origin_tax
            .checked_add(self.destination_tax)
            .and_then(|sum| sum.checked_add(self.cross_tax))
            .ok_or(Error::Overflow {
                operation: "total tax",
            })
    }

    /// True when every column is zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        [
            self.taxable_value,
            self.origin_tax,
            self.destination_tax,
            self.cross_tax,
            self.amount,
        ]
        .iter()
        .all(Decimal::is_zero)
    }
}

/// Formats a fractional tax rate as a whole percentage (`0.03` becomes `"3%"`)
#[must_use]
pub fn format_tax_rate(tax_rate: Decimal) -> String {
    format!("{}%", (tax_rate * dec!(100)).normalize())
}
