//! Account transaction feed: date window, action filtering and row formatting.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use tracing::info;

use crate::aggregate::{format_local, format_xtz, PLATFORM_TZ};
use crate::catalog::{platform_name, Action, Category, Platform, ALL_PLATFORMS};
use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::{Record, RecordType};
use crate::ranking::row_color;
use crate::source::MarketSource;

const UPSTREAM_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    /// Local midnight of `start_date` up to local midnight after `end_date`.
    pub fn from_dates(start_date: NaiveDate, end_date: NaiveDate) -> Option<Self> {
        let end_exclusive = end_date.checked_add_days(Days::new(1))?;
        Some(Self {
            start: local_midnight_utc(start_date)?,
            end: local_midnight_utc(end_exclusive)?,
        })
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    pub fn start_param(&self) -> String {
        self.start.format(UPSTREAM_TIME_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(UPSTREAM_TIME_FORMAT).to_string()
    }
}

fn local_midnight_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    PLATFORM_TZ
        .from_local_datetime(&midnight)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub address: String,
    pub platforms: Vec<Platform>,
    pub categories: Vec<Category>,
    pub actions: Vec<Action>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub window: QueryWindow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedRecord {
    pub color: &'static str,
    pub time: String,
    pub platform: &'static str,
    pub from: String,
    pub from_url: String,
    pub to: String,
    pub to_url: String,
    pub token: String,
    pub token_url: String,
    pub action: String,
    pub amount: String,
    pub price: String,
}

pub fn allowed_record_types(categories: &[Category], actions: &[Action]) -> Vec<RecordType> {
    let mut allowed = Vec::new();
    for category in categories {
        for record_type in category.record_types() {
            let by_prefix = actions
                .iter()
                .any(|action| action.as_str() == record_type.prefix());
            let cancel_with_swap =
                *record_type == RecordType::CancelSwap && actions.contains(&Action::Swap);
            if (by_prefix || cancel_with_swap) && !allowed.contains(record_type) {
                allowed.push(record_type.clone());
            }
        }
    }
    allowed
}

fn platform_allowed(record: &Record, platforms: &[Platform]) -> bool {
    if ALL_PLATFORMS
        .iter()
        .all(|platform| platforms.contains(platform))
    {
        return true;
    }
    record
        .contract
        .as_deref()
        .and_then(Platform::from_contract)
        .map(|platform| platforms.contains(&platform))
        .unwrap_or(false)
}

pub fn truncate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(3).collect();
    let tail: String = chars[chars.len().saturating_sub(3)..].iter().collect();
    format!("{head}...{tail}")
}

fn party(alias: Option<&str>, address: Option<&str>, cfg: &ApiConfig) -> (String, String) {
    let label = match (alias.filter(|alias| !alias.is_empty()), address) {
        (Some(alias), _) => alias.to_string(),
        (None, Some(address)) if !address.is_empty() => truncate_address(address),
        _ => String::new(),
    };
    let url = match address.filter(|address| !address.is_empty()) {
        Some(address) => cfg.profile_url(address),
        None => cfg.site_root(),
    };
    (label, url)
}

fn token_url(record: &Record, cfg: &ApiConfig) -> String {
    match (
        record.contract.as_deref().and_then(Platform::from_contract),
        record.token_id,
    ) {
        (Some(platform), Some(token_id)) => {
            format!("{}/{}/{token_id}", cfg.site_base, platform.slug())
        }
        _ => cfg.site_root(),
    }
}

pub fn format_record(record: &Record, index: usize, cfg: &ApiConfig) -> FormattedRecord {
    let (from, from_url) = party(record.from_alias.as_deref(), record.from.as_deref(), cfg);
    let (to, to_url) = party(record.to_alias.as_deref(), record.to.as_deref(), cfg);

    FormattedRecord {
        color: row_color(index + 1),
        time: format_local(record.timestamp),
        platform: platform_name(record.contract.as_deref()),
        from,
        from_url,
        to,
        to_url,
        token: record.token_name.clone().unwrap_or_default(),
        token_url: token_url(record, cfg),
        action: record.kind.label(),
        amount: record
            .amount
            .map(|amount| amount.to_string())
            .unwrap_or_default(),
        price: record
            .price
            .map(|price| format_xtz(price as f64))
            .unwrap_or_default(),
    }
}

pub fn filter_records(
    records: &[Record],
    query: &RecordQuery,
    cfg: &ApiConfig,
) -> Vec<FormattedRecord> {
    let allowed = allowed_record_types(&query.categories, &query.actions);
    records
        .iter()
        .filter(|record| platform_allowed(record, &query.platforms))
        .filter(|record| allowed.contains(&record.kind))
        .enumerate()
        .map(|(index, record)| format_record(record, index, cfg))
        .collect()
}

pub fn filter_account_records(
    source: &dyn MarketSource,
    query: &RecordQuery,
    cfg: &ApiConfig,
) -> Result<Vec<FormattedRecord>, AppError> {
    let records = source.account_records(&query.address, Some(&query.window))?;
    let formatted = filter_records(&records, query, cfg);

    info!(
        component = "records",
        event = "records.filtered",
        address = %query.address,
        fetched = records.len(),
        kept = formatted.len()
    );

    Ok(formatted)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    pub user: String,
    pub profile_url: String,
    pub generated_at: String,
    pub start_date: String,
    pub end_date: String,
    pub records: Vec<FormattedRecord>,
}

pub fn record_report(
    source: &dyn MarketSource,
    query: &RecordQuery,
    cfg: &ApiConfig,
    now: DateTime<Utc>,
) -> Result<Option<RecordReport>, AppError> {
    let records = filter_account_records(source, query, cfg)?;
    if records.is_empty() {
        return Ok(None);
    }

    let user = source
        .alias(&query.address)
        .unwrap_or_else(|_| query.address.clone());

    Ok(Some(RecordReport {
        user,
        profile_url: cfg.profile_url(&query.address),
        generated_at: format_local(now),
        start_date: query.start_date.format("%Y-%m-%d").to_string(),
        end_date: query.end_date.format("%Y-%m-%d").to_string(),
        records,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(kind: &str, contract: Option<&str>) -> Record {
        serde_json::from_value(serde_json::json!({
            "type": kind,
            "timestamp": "2024-01-01T03:00:00Z",
            "price": 1500000,
            "amount": 1,
            "from": "tz1AbcdefXyz",
            "to": null,
            "contract": contract,
            "tokenId": 42,
            "tokenName": "Sunrise"
        }))
        .unwrap()
    }

    fn query(
        platforms: Vec<Platform>,
        categories: Vec<Category>,
        actions: Vec<Action>,
    ) -> RecordQuery {
        RecordQuery {
            address: "tz1me".to_string(),
            platforms,
            categories,
            actions,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 1),
            window: QueryWindow::from_dates(date(2024, 1, 1), date(2024, 1, 1)).unwrap(),
        }
    }

    #[test]
    fn single_day_window_spans_full_local_day() {
        let window = QueryWindow::from_dates(date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        assert_eq!(window.start_param(), "2023-12-31T16:00:00Z");
        assert_eq!(window.end_param(), "2024-01-01T16:00:00Z");
        assert_eq!(
            format_local(window.start),
            "2024-01-01 00:00:00"
        );
        assert_eq!(format_local(window.end), "2024-01-02 00:00:00");
        assert!(!window.contains(window.end));
        assert!(window.contains(window.start));
    }

    #[test]
    fn gacha_collect_expands_to_collect_gacha_only() {
        let allowed = allowed_record_types(&[Category::Gacha], &[Action::Collect]);
        assert_eq!(allowed, vec![RecordType::CollectGacha]);
    }

    #[test]
    fn swap_action_keeps_cancel_swap() {
        let allowed = allowed_record_types(&[Category::General], &[Action::Swap]);
        assert_eq!(allowed, vec![RecordType::Swap, RecordType::CancelSwap]);

        let allowed = allowed_record_types(&[Category::General], &[Action::Make]);
        assert_eq!(allowed, vec![RecordType::MakeOffer]);
    }

    #[test]
    fn platform_filter_requires_known_contract_unless_all_selected() {
        let records = vec![
            record("collect", Some(Platform::Asmeir.contract())),
            record("collect", Some("KT1unknown")),
            record("collect", None),
        ];
        let cfg = ApiConfig::default();

        let some = query(vec![Platform::Asmeir], vec![Category::General], vec![Action::Collect]);
        let rows = filter_records(&records, &some, &cfg);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].platform, "ASMeiR");

        let all = query(ALL_PLATFORMS.to_vec(), vec![Category::General], vec![Action::Collect]);
        let rows = filter_records(&records, &all, &cfg);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].platform, "");
        assert_eq!(rows[1].token_url, "https://akaswap.com/");
        assert_eq!(rows[2].color, "rgba(255, 255, 255, 1)");
        assert_eq!(rows[1].color, "rgba(236, 236, 236, 0.8)");
    }

    #[test]
    fn formatted_row_shows_truncated_parties_and_price() {
        let cfg = ApiConfig::default();
        let row = format_record(
            &record("collect_offer", Some(Platform::Akaobj.contract())),
            0,
            &cfg,
        );

        assert_eq!(row.time, "2024-01-01 11:00:00");
        assert_eq!(row.from, "tz1...Xyz");
        assert_eq!(row.from_url, "https://akaswap.com/tz/tz1AbcdefXyz");
        assert_eq!(row.to, "");
        assert_eq!(row.to_url, "https://akaswap.com/");
        assert_eq!(row.token_url, "https://akaswap.com/akaobj/42");
        assert_eq!(row.action, "collect offer");
        assert_eq!(row.price, "1.50 xtz");
    }

    #[test]
    fn alias_wins_over_address_and_missing_price_is_blank() {
        let mut rec = record("transfer", Some(Platform::Akaobj.contract()));
        rec.from_alias = Some("Alice".to_string());
        rec.price = None;
        let row = format_record(&rec, 0, &ApiConfig::default());
        assert_eq!(row.from, "Alice");
        assert_eq!(row.price, "");
    }

    #[test]
    fn report_is_none_when_filters_drop_everything() {
        use crate::source::InMemoryMarketSource;

        let source = InMemoryMarketSource::new()
            .with_account_records("tz1me", vec![record("mint", Some(Platform::Akaobj.contract()))])
            .with_alias("tz1me", "Me");
        let cfg = ApiConfig::default();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        let none = query(ALL_PLATFORMS.to_vec(), vec![Category::General], vec![Action::Burn]);
        assert_eq!(record_report(&source, &none, &cfg, now).unwrap(), None);

        let some = query(ALL_PLATFORMS.to_vec(), vec![Category::General], vec![Action::Mint]);
        let report = record_report(&source, &some, &cfg, now).unwrap().unwrap();
        assert_eq!(report.user, "Me");
        assert_eq!(report.start_date, "2024-01-01");
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].action, "mint");
    }

    #[test]
    fn short_addresses_still_truncate() {
        assert_eq!(truncate_address("ab"), "ab...ab");
    }
}
