//! # Derivations
//!
//! Per-document-type functions that compute dependent fields from the rest
//! of the payload. They run after the box rule and before the required and
//! numeric checks, so derived fields are validated like caller fields.
//!
//! ## The Three Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  derive_total_amount        quotations, exportSales, purchaseContracts  │
//! │    totalAmount = Σ quantity × unitPrice          (ALWAYS overwritten)   │
//! │                                                                         │
//! │  derive_total_packages      shipmentDetails                             │
//! │    totalPackages > 0 ? keep : Σ quantity          (caller may override) │
//! │                                                                         │
//! │  derive_receivable_date     settlements                                 │
//! │    receivableDate = shipDate + paymentCycleDays   (no shipDate: no-op)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The total/package asymmetry is intentional: operators may hand-enter a
//! package count that differs from the item quantities, but a monetary total
//! always follows the lines.

use chrono::{DateTime, Days, NaiveDate};
use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};
use crate::items::{extract_items, ItemsSummary, ITEMS_FIELD};
use crate::numeric::{normalize, opt_to_float};
use crate::types::Payload;

/// Signature every derivation shares: mutate the payload in place.
pub type DeriveFn = fn(&mut Payload) -> ValidationResult<()>;

pub const TOTAL_AMOUNT_FIELD: &str = "totalAmount";
pub const TOTAL_PACKAGES_FIELD: &str = "totalPackages";
pub const SHIP_DATE_FIELD: &str = "shipDate";
pub const PAYMENT_CYCLE_DAYS_FIELD: &str = "paymentCycleDays";
pub const RECEIVABLE_DATE_FIELD: &str = "receivableDate";

/// Output format of derived dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Totals
// =============================================================================

/// Writes `totalAmount` = Σ quantity × unitPrice, replacing any caller value.
pub fn derive_total_amount(payload: &mut Payload) -> ValidationResult<()> {
    let summary = {
        let items = extract_items(payload.get(ITEMS_FIELD))?;
        ItemsSummary::of(&items)
    };
    payload.insert(
        TOTAL_AMOUNT_FIELD.to_string(),
        normalize(summary.total_amount),
    );
    Ok(())
}

/// Keeps a positive caller-supplied `totalPackages`, otherwise writes
/// Σ quantity.
///
/// The items list is validated even when the caller value is kept.
pub fn derive_total_packages(payload: &mut Payload) -> ValidationResult<()> {
    let summary = {
        let items = extract_items(payload.get(ITEMS_FIELD))?;
        ItemsSummary::of(&items)
    };

    let total = match opt_to_float(payload.get(TOTAL_PACKAGES_FIELD)) {
        Some(current) if current > 0.0 => current,
        _ => summary.total_qty,
    };
    payload.insert(TOTAL_PACKAGES_FIELD.to_string(), normalize(total));
    Ok(())
}

// =============================================================================
// Dates
// =============================================================================

/// Writes `receivableDate` = `shipDate` + `paymentCycleDays` calendar days.
///
/// ## Rules
/// - `shipDate` absent, not a string, or blank → nothing happens
/// - `shipDate` unparsable → `InvalidFormat`
/// - `paymentCycleDays` not numeric → `NotNumeric`
/// - fractional day counts are truncated toward zero
pub fn derive_receivable_date(payload: &mut Payload) -> ValidationResult<()> {
    let ship_date_raw = match payload.get(SHIP_DATE_FIELD).and_then(Value::as_str) {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(()),
    };

    let ship_date = parse_date(ship_date_raw).ok_or_else(|| ValidationError::InvalidFormat {
        field: SHIP_DATE_FIELD.to_string(),
        reason: format!("'{}' is not a recognised date", ship_date_raw.trim()),
    })?;

    let days = opt_to_float(payload.get(PAYMENT_CYCLE_DAYS_FIELD)).ok_or_else(|| {
        ValidationError::NotNumeric {
            field: PAYMENT_CYCLE_DAYS_FIELD.to_string(),
        }
    })?;

    let receivable = add_days(ship_date, days.trunc()).ok_or_else(|| {
        ValidationError::InvalidFormat {
            field: PAYMENT_CYCLE_DAYS_FIELD.to_string(),
            reason: "day count overflows the calendar".to_string(),
        }
    })?;

    payload.insert(
        RECEIVABLE_DATE_FIELD.to_string(),
        Value::from(receivable.format(DATE_FORMAT).to_string()),
    );
    Ok(())
}

/// Parses a date written as `YYYY-MM-DD`, RFC 3339, or `YYYY/MM/DD`.
///
/// Formats are tried in that order; the first success wins. An RFC 3339
/// timestamp yields the calendar date in its own offset.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use erp_core::derive::parse_date;
///
/// let expected = NaiveDate::from_ymd_opt(2026, 2, 10);
/// assert_eq!(parse_date("2026-02-10"), expected);
/// assert_eq!(parse_date("2026-02-10T23:30:00+08:00"), expected);
/// assert_eq!(parse_date("2026/02/10"), expected);
/// assert_eq!(parse_date("10.02.2026"), None);
/// ```
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let clean = raw.trim();
    if clean.is_empty() {
        return None;
    }

    if is_plain_date(clean, b'-') {
        if let Ok(date) = NaiveDate::parse_from_str(clean, "%Y-%m-%d") {
            return Some(date);
        }
    }
    if is_rfc3339_shape(clean) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(clean) {
            return Some(dt.date_naive());
        }
    }
    if is_plain_date(clean, b'/') {
        return NaiveDate::parse_from_str(clean, "%Y/%m/%d").ok();
    }
    None
}

/// Exactly `DDDD<sep>DD<sep>DD`: zero-padded, unsigned.
fn is_plain_date(s: &str, sep: u8) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == sep,
            _ => c.is_ascii_digit(),
        })
}

/// A plain `-` date followed by an uppercase `T`.
fn is_rfc3339_shape(s: &str) -> bool {
    s.len() > 10
        && s.is_char_boundary(10)
        && is_plain_date(&s[..10], b'-')
        && s.as_bytes()[10] == b'T'
}

fn add_days(date: NaiveDate, days: f64) -> Option<NaiveDate> {
    if days >= 0.0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new((-days) as u64))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
