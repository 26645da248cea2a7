use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{error, warn};

use crate::records::{SaleRecord, FIELD_DATE, FIELD_PRODUCT, FIELD_QUANTITY, FIELD_UNIT_PRICE};

// Calendar-date format shared by the record `fecha` field and the
// filter bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const TOP_PRODUCTS_LIMIT: usize = 5;

/// Outcome of coercing a single raw field. `Blank` covers empty and
/// whitespace-only values; `Invalid` carries the parser's reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Missing,
    Blank,
    Invalid(String),
}

/// Fetches `field` from `record`, trims it and parses it as `T`. Never
/// logs; each aggregation maps the error to its own skip policy.
pub fn parse_field<T>(record: &SaleRecord, field: &str) -> Result<T, FieldError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = record.field(field).ok_or(FieldError::Missing)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Blank);
    }
    trimmed
        .parse()
        .map_err(|err: T::Err| FieldError::Invalid(err.to_string()))
}

fn warn_skipped(row: usize, field: &str, err: &FieldError) {
    match err {
        FieldError::Missing => warn!("row {row}: missing `{field}`, skipping"),
        FieldError::Blank => warn!("row {row}: blank `{field}`, skipping"),
        FieldError::Invalid(reason) => {
            warn!("row {row}: cannot parse `{field}`: {reason}, skipping")
        }
    }
}

/// Total revenue of the extract: the sum of `precio_unitario * cantidad`
/// over every record carrying usable values for both fields. Skipped
/// rows are reported and contribute nothing; an empty or all-invalid
/// input totals 0.
pub fn total_revenue(records: &[SaleRecord]) -> f64 {
    let mut total = 0.0;

    for (index, record) in records.iter().enumerate() {
        let row = index + 1;
        let unit_price = match parse_field::<f64>(record, FIELD_UNIT_PRICE) {
            Ok(value) => value,
            Err(err) => {
                warn_skipped(row, FIELD_UNIT_PRICE, &err);
                continue;
            }
        };
        let quantity = match parse_field::<i64>(record, FIELD_QUANTITY) {
            Ok(value) => value,
            Err(err) => {
                warn_skipped(row, FIELD_QUANTITY, &err);
                continue;
            }
        };

        total += unit_price * quantity as f64;
    }

    total
}

/// Total units sold. Rows without a usable `cantidad` are ignored
/// without comment.
pub fn total_units(records: &[SaleRecord]) -> i64 {
    records
        .iter()
        .filter_map(|record| parse_field::<i64>(record, FIELD_QUANTITY).ok())
        .sum()
}

// Accumulates quantity per product, entries in first-seen order. Shared
// by both ranking operations; `log_failures` keeps their different
// verbosity (the top-N ranking skips bad rows silently, the best-product
// lookup reports them).
fn product_totals(records: &[SaleRecord], log_failures: bool) -> Vec<(String, i64)> {
    let mut totals: Vec<(String, i64)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let Some(product) = record.field(FIELD_PRODUCT) else {
            continue;
        };
        let quantity = match parse_field::<i64>(record, FIELD_QUANTITY) {
            Ok(value) => value,
            Err(FieldError::Missing) => continue,
            Err(err) => {
                if log_failures {
                    warn_skipped(index + 1, FIELD_QUANTITY, &err);
                }
                continue;
            }
        };

        match slots.get(product) {
            Some(&slot) => totals[slot].1 += quantity,
            None => {
                slots.insert(product.to_string(), totals.len());
                totals.push((product.to_string(), quantity));
            }
        }
    }

    totals
}

/// Up to five products by total quantity, highest first.
pub fn top_products(records: &[SaleRecord]) -> Vec<(String, i64)> {
    let mut totals = product_totals(records, false);
    // Stable sort: products tied on quantity keep first-seen order.
    totals.sort_by_key(|entry| Reverse(entry.1));
    totals.truncate(TOP_PRODUCTS_LIMIT);
    totals
}

/// The single highest-volume product, or `None` when nothing valid
/// accumulates. Among tied products the first one seen wins.
pub fn best_selling_product(records: &[SaleRecord]) -> Option<(String, i64)> {
    if records.is_empty() {
        warn!("no sales records to rank");
        return None;
    }

    let mut best: Option<(String, i64)> = None;
    for (product, quantity) in product_totals(records, true) {
        let beats = best
            .as_ref()
            .map_or(true, |(_, best_quantity)| quantity > *best_quantity);
        if beats {
            best = Some((product, quantity));
        }
    }

    best
}

/// Records whose `fecha` falls inside `[start, end]`, both bounds
/// inclusive, in their original order and representation. A bound that
/// does not parse as YYYY-MM-DD aborts the call: one diagnostic, empty
/// result, no per-record work.
pub fn sales_in_date_range(records: &[SaleRecord], start: &str, end: &str) -> Vec<SaleRecord> {
    let bounds = NaiveDate::parse_from_str(start, DATE_FORMAT)
        .and_then(|from| NaiveDate::parse_from_str(end, DATE_FORMAT).map(|to| (from, to)));
    let (from, to) = match bounds {
        Ok(bounds) => bounds,
        Err(err) => {
            error!("invalid date range [{start}, {end}]: {err}");
            return Vec::new();
        }
    };

    let mut filtered = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let Some(raw) = record.field(FIELD_DATE) else {
            continue;
        };
        match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
            Ok(date) if from <= date && date <= to => filtered.push(record.clone()),
            Ok(_) => {}
            Err(err) => warn!(
                "row {}: cannot parse `{FIELD_DATE}` value `{raw}`: {err}",
                index + 1
            ),
        }
    }

    filtered
}
