//! Derived per-token and per-listing values.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::AppError;
use crate::models::{Listing, Record, Token};

pub const MUTEZ_PER_XTZ: f64 = 1_000_000.0;

// Reporting timezone of the platform (UTC+8, no DST).
pub const PLATFORM_TZ: Tz = chrono_tz::Asia::Taipei;

pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn to_local(ts: DateTime<Utc>) -> DateTime<Tz> {
    ts.with_timezone(&PLATFORM_TZ)
}

pub fn format_local(ts: DateTime<Utc>) -> String {
    to_local(ts).format(DISPLAY_TIME_FORMAT).to_string()
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn xtz(mutez: f64) -> f64 {
    mutez / MUTEZ_PER_XTZ
}

pub fn format_xtz(mutez: f64) -> String {
    format!("{:.2} xtz", xtz(mutez))
}

pub fn completed_sale_prices(records: &[Record]) -> Vec<i64> {
    records
        .iter()
        .rev()
        .filter(|record| record.kind.is_completed_sale())
        .filter_map(|record| record.price)
        .collect()
}

pub fn lowest_sold_price(records: &[Record]) -> Option<i64> {
    completed_sale_prices(records).into_iter().min()
}

pub fn average_sold_price(records: &[Record]) -> Option<f64> {
    let prices = completed_sale_prices(records);
    if prices.is_empty() {
        return None;
    }
    let sum: f64 = prices.iter().map(|price| *price as f64).sum();
    Some(sum / prices.len() as f64)
}

pub fn min_sale_price(token: &Token) -> Option<i64> {
    token.swaps().iter().map(|swap| swap.xtz_per_token).min()
}

pub fn own_amount(token: &Token, address: &str) -> Option<i64> {
    token
        .owners
        .iter()
        .find(|(owner, _)| owner == address)
        .map(|(_, amount)| *amount)
}

/// Net mutez spent by `address` on each token (collects add, sells subtract
/// `amount * price`), divided by what it holds now. Output order follows
/// `tokens`.
///
/// Holding nothing of a token is a division by zero and is reported as
/// [`AppError::ZeroHolding`].
pub fn collectible_prices(
    tokens: &[Token],
    records: &[Record],
    address: &str,
) -> Result<Vec<f64>, AppError> {
    let mut totals: HashMap<(&str, u64), i64> = tokens
        .iter()
        .map(|token| ((token.contract.as_str(), token.token_id), 0))
        .collect();

    for record in records {
        let (Some(contract), Some(token_id)) = (record.contract.as_deref(), record.token_id)
        else {
            continue;
        };
        let Some(total) = totals.get_mut(&(contract, token_id)) else {
            continue;
        };

        let value = record.amount.unwrap_or(0) * record.price.unwrap_or(0);
        let kind = record.kind.as_str();
        if kind.starts_with("collect") {
            *total += value;
        } else if kind.starts_with("sell") {
            *total -= value;
        }
    }

    tokens
        .iter()
        .map(|token| {
            let holding = own_amount(token, address).unwrap_or(0);
            if holding == 0 {
                return Err(AppError::ZeroHolding {
                    contract: token.contract.clone(),
                    token_id: token.token_id,
                });
            }
            let total = totals
                .get(&(token.contract.as_str(), token.token_id))
                .copied()
                .unwrap_or(0);
            Ok(round2(total as f64 / holding as f64))
        })
        .collect()
}

pub fn bundle_item_amount(listing: &Listing) -> i64 {
    listing.items.iter().map(|item| item.amount).sum()
}

pub fn fill_rate(amount: Option<i64>, total: Option<i64>) -> Option<f64> {
    match (amount, total) {
        (Some(amount), Some(total)) if total != 0 => Some(round2(amount as f64 / total as f64)),
        _ => None,
    }
}
