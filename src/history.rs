//! Per-token price history: chart series, summary statistics and owner split.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::aggregate::{
    completed_sale_prices, format_local, format_xtz, min_sale_price, round2, to_local, xtz,
    DISPLAY_TIME_FORMAT,
};
use crate::catalog::Platform;
use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::{Record, Token};
use crate::source::MarketSource;

const PRICE_COLOR: &str = "rgba(255, 151, 151, 0.8)";
const AVERAGE_COLOR: &str = "rgba(255, 208, 151, 0.8)";
const MIN_SALE_COLOR: &str = "rgba(150, 226, 255, 0.8)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HistoryWarning {
    NonExistentPhoto,
    NonExistentPriceHistory,
    NonExistentOwner,
}

impl HistoryWarning {
    pub fn message(self) -> &'static str {
        match self {
            Self::NonExistentPhoto => "Non-existent Photo",
            Self::NonExistentPriceHistory => "Non-existent Price History",
            Self::NonExistentOwner => "Non-existent Owner",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistoryPoint {
    pub time: String,
    pub price: f64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub token_id: u64,
    pub amount: i64,
    pub transactions: usize,
    pub max_price: String,
    pub mean_price: String,
    pub min_price: String,
    pub min_sale_price: String,
}

impl HistorySummary {
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Token ID", self.token_id.to_string()),
            ("Amount", self.amount.to_string()),
            ("Total Transaction Number", self.transactions.to_string()),
            ("Max Transaction Price", self.max_price.clone()),
            ("Mean Transaction Price", self.mean_price.clone()),
            ("Min Transaction Price", self.min_price.clone()),
            ("Current Min Sale Price", self.min_sale_price.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistory {
    pub name: String,
    pub url: String,
    pub photo: Option<String>,
    pub generated_at: String,
    pub min_sale_price: Option<i64>,
    pub points: Vec<PriceHistoryPoint>,
    pub owners: Vec<(String, i64)>,
    pub summary: HistorySummary,
    pub warnings: Vec<HistoryWarning>,
}

impl PriceHistory {
    pub fn chart_option(&self) -> Option<Value> {
        if self.points.is_empty() {
            return None;
        }
        Some(line_chart_option(&self.points, self.min_sale_price))
    }

    pub fn owner_option(&self) -> Option<Value> {
        if self.owners.is_empty() {
            return None;
        }
        Some(owner_pie_option(&self.owners))
    }
}

pub fn price_points(records: &[Record]) -> Vec<PriceHistoryPoint> {
    let mut sum = 0.0;
    records
        .iter()
        .rev()
        .filter(|record| record.kind.is_completed_sale())
        .filter_map(|record| record.price.map(|price| (record.timestamp, price)))
        .enumerate()
        .map(|(index, (timestamp, price))| {
            let price = xtz(price as f64);
            sum += price;
            PriceHistoryPoint {
                time: to_local(timestamp).format(DISPLAY_TIME_FORMAT).to_string(),
                price,
                average: round2(sum / (index + 1) as f64),
            }
        })
        .collect()
}

/// Owner amounts labelled by alias where one is known. Owners sharing an
/// alias are summed into the first one's slot; upstream order is kept.
pub fn owner_breakdown(token: &Token) -> Vec<(String, i64)> {
    let mut slices: Vec<(String, i64)> = Vec::with_capacity(token.owners.len());
    for (address, amount) in &token.owners {
        let label = token
            .owner_aliases
            .as_ref()
            .and_then(|aliases| aliases.get(address))
            .and_then(|alias| alias.as_deref())
            .filter(|alias| !alias.is_empty())
            .unwrap_or(address);
        match slices.iter_mut().find(|(existing, _)| existing == label) {
            Some((_, total)) => *total += amount,
            None => slices.push((label.to_string(), *amount)),
        }
    }
    slices
}

pub fn summarize(token: &Token, records: &[Record], min_sale: Option<i64>) -> HistorySummary {
    let prices = completed_sale_prices(records);
    let (max_price, mean_price, min_price) = if prices.is_empty() {
        (String::new(), String::new(), String::new())
    } else {
        let max = prices.iter().copied().max().unwrap_or_default();
        let min = prices.iter().copied().min().unwrap_or_default();
        let mean = prices.iter().map(|price| *price as f64).sum::<f64>() / prices.len() as f64;
        (format_xtz(max as f64), format_xtz(mean), format_xtz(min as f64))
    };

    HistorySummary {
        token_id: token.token_id,
        amount: token.amount,
        transactions: prices.len(),
        max_price,
        mean_price,
        min_price,
        min_sale_price: min_sale
            .map(|price| format_xtz(price as f64))
            .unwrap_or_default(),
    }
}

pub fn build_history(
    source: &dyn MarketSource,
    token_id: u64,
    platform: Platform,
    cfg: &ApiConfig,
    now: DateTime<Utc>,
) -> Result<PriceHistory, AppError> {
    let contract = platform.contract();
    let token = source.token(contract, token_id)?;
    let mut warnings = Vec::new();

    let photo = token.display_uri.as_deref().map(|uri| cfg.gateway_uri(uri));
    if photo.is_none() {
        warnings.push(HistoryWarning::NonExistentPhoto);
    }

    let min_sale = min_sale_price(&token);
    let records = source.token_records(contract, token_id)?;
    let points = price_points(&records);
    if points.is_empty() {
        warnings.push(HistoryWarning::NonExistentPriceHistory);
    }

    let owners = owner_breakdown(&token);
    if owners.is_empty() {
        warnings.push(HistoryWarning::NonExistentOwner);
    }

    info!(
        component = "history",
        event = "history.built",
        platform = platform.slug(),
        token_id,
        points = points.len(),
        owners = owners.len(),
        warnings = warnings.len()
    );

    Ok(PriceHistory {
        name: token.display_name().to_string(),
        url: format!("{}/{}/{token_id}", cfg.site_base, platform.slug()),
        photo,
        generated_at: format_local(now),
        min_sale_price: min_sale,
        summary: summarize(&token, &records, min_sale),
        points,
        owners,
        warnings,
    })
}

fn line_chart_option(points: &[PriceHistoryPoint], min_sale: Option<i64>) -> Value {
    let prices: Vec<Value> = points
        .iter()
        .map(|point| json!([point.time, point.price]))
        .collect();
    let averages: Vec<Value> = points
        .iter()
        .map(|point| json!([point.time, point.average]))
        .collect();

    let mut price_series = json!({
        "name": "History Transaction Price",
        "type": "line",
        "data": prices,
        "label": {"show": false},
        "itemStyle": {"color": PRICE_COLOR},
        "lineStyle": {"width": 3}
    });
    let mut average_series = json!({
        "name": "Time-based Average Transaction Price",
        "type": "line",
        "data": averages,
        "label": {"show": false},
        "itemStyle": {"color": AVERAGE_COLOR},
        "lineStyle": {"width": 1}
    });

    if let Some(min_sale) = min_sale {
        let mark_line = json!({
            "data": [{"name": "Current Min Sale Price", "yAxis": xtz(min_sale as f64)}],
            "lineStyle": {"color": MIN_SALE_COLOR, "type": "dotted"}
        });
        price_series["markLine"] = mark_line.clone();
        average_series["markLine"] = mark_line;
    }

    json!({
        "title": {"text": "Price History"},
        "tooltip": {"trigger": "axis"},
        "legend": {},
        "xAxis": {"name": "Time", "type": "time"},
        "yAxis": {"name": "Price (xtz)", "type": "value"},
        "series": [price_series, average_series]
    })
}

fn owner_pie_option(owners: &[(String, i64)]) -> Value {
    let data: Vec<Value> = owners
        .iter()
        .map(|(name, amount)| json!({"name": name, "value": amount}))
        .collect();

    json!({
        "title": {"text": "Owners"},
        "tooltip": {"trigger": "item"},
        "legend": {"show": false},
        "series": [{
            "type": "pie",
            "data": data,
            "label": {"show": false}
        }]
    })
}
