//! Ranking of an account's tokens and of active gacha/auction/bundle listings.
//!
//! Each sortable field carries an explicit [`ValueUnit`] that decides how its
//! value is shown, so a new field can never be mis-formatted by its name.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::{
    average_sold_price, bundle_item_amount, collectible_prices, fill_rate, format_local,
    format_xtz, lowest_sold_price, min_sale_price, own_amount,
};
use crate::catalog::{listing_version_segment, AccountRole, ListingKind, Platform};
use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::{Listing, Token};
use crate::source::MarketSource;

pub const ROW_WHITE: &str = "rgba(255, 255, 255, 1)";
pub const ROW_GREY: &str = "rgba(236, 236, 236, 0.8)";

pub fn row_color(rank: usize) -> &'static str {
    if rank % 2 == 1 {
        ROW_WHITE
    } else {
        ROW_GREY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(Self::Ascending),
            "desc" => Some(Self::Descending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueUnit {
    Amount,
    Price,
    Rate,
    Time,
    Plain,
}

impl ValueUnit {
    pub fn label(self) -> &'static str {
        match self {
            Self::Amount => "Amount",
            Self::Price => "Price",
            Self::Rate => "Rate",
            Self::Time => "Time",
            Self::Plain => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Int(i64),
    Float(f64),
    Time(DateTime<Utc>),
    Text(String),
}

impl SortValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Time(_) | Self::Text(_) => None,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => Ordering::Equal,
            },
        }
    }

    fn plain_text(&self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Time(ts) => format_local(*ts),
            Self::Text(text) => text.clone(),
        }
    }
}

pub fn format_value(unit: ValueUnit, value: Option<&SortValue>) -> Option<String> {
    match unit {
        ValueUnit::Plain => None,
        ValueUnit::Price => Some(
            value
                .and_then(SortValue::as_f64)
                .map(format_xtz)
                .unwrap_or_default(),
        ),
        ValueUnit::Amount | ValueUnit::Rate | ValueUnit::Time => {
            Some(value.map(SortValue::plain_text).unwrap_or_default())
        }
    }
}

/// Stable sort by value in `direction`. Items without a value keep their
/// input order and always trail the valued ones.
pub fn sort_by_value<T>(
    items: Vec<(T, Option<SortValue>)>,
    direction: Direction,
) -> Vec<(T, Option<SortValue>)> {
    let (mut valued, missing): (Vec<_>, Vec<_>) =
        items.into_iter().partition(|(_, value)| value.is_some());

    valued.sort_by(|(_, a), (_, b)| {
        let (Some(a), Some(b)) = (a, b) else {
            return Ordering::Equal;
        };
        match direction {
            Direction::Ascending => a.compare(b),
            Direction::Descending => b.compare(a),
        }
    });

    valued.extend(missing);
    valued
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub rank: usize,
    pub color: &'static str,
    pub id: String,
    pub name: String,
    pub platform: Option<&'static str>,
    pub url: String,
    pub photo: Option<String>,
    pub option: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenField {
    HighestSoldPrice,
    RecentlySoldPrice,
    LowestSoldPrice,
    AverageSoldPrice,
    MinSalePrice,
    Amount,
    CollectiblePrice,
    OwnAmount,
    TokenId,
    Name,
}

pub const ALL_TOKEN_FIELDS: [TokenField; 10] = [
    TokenField::HighestSoldPrice,
    TokenField::RecentlySoldPrice,
    TokenField::LowestSoldPrice,
    TokenField::AverageSoldPrice,
    TokenField::MinSalePrice,
    TokenField::Amount,
    TokenField::CollectiblePrice,
    TokenField::OwnAmount,
    TokenField::TokenId,
    TokenField::Name,
];

impl TokenField {
    pub fn parse(raw: &str) -> Option<Self> {
        ALL_TOKEN_FIELDS
            .iter()
            .copied()
            .find(|field| field.key() == raw)
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::HighestSoldPrice => "highestSoldPrice",
            Self::RecentlySoldPrice => "recentlySoldPrice",
            Self::LowestSoldPrice => "lowestSoldPrice",
            Self::AverageSoldPrice => "averageSoldPrice",
            Self::MinSalePrice => "minSalePrice",
            Self::Amount => "amount",
            Self::CollectiblePrice => "collectiblePrice",
            Self::OwnAmount => "ownAmount",
            Self::TokenId => "tokenId",
            Self::Name => "name",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::HighestSoldPrice => "Highest Transaction Price",
            Self::RecentlySoldPrice => "Recent Transaction Price",
            Self::LowestSoldPrice => "Lowest Transaction Price",
            Self::AverageSoldPrice => "Average Transaction Price",
            Self::MinSalePrice => "Current Minimum Sale Price",
            Self::Amount => "Amount",
            Self::CollectiblePrice => "Collectible Price",
            Self::OwnAmount => "Own Amount",
            Self::TokenId => "Token ID",
            Self::Name => "Name",
        }
    }

    pub fn unit(self) -> ValueUnit {
        match self {
            Self::Amount | Self::OwnAmount => ValueUnit::Amount,
            Self::TokenId | Self::Name => ValueUnit::Plain,
            Self::HighestSoldPrice
            | Self::RecentlySoldPrice
            | Self::LowestSoldPrice
            | Self::AverageSoldPrice
            | Self::MinSalePrice
            | Self::CollectiblePrice => ValueUnit::Price,
        }
    }

    pub fn unit_label(self) -> &'static str {
        match self.unit() {
            ValueUnit::Amount => "Amount",
            _ => "Price",
        }
    }

    pub fn collection_only(self) -> bool {
        matches!(self, Self::CollectiblePrice | Self::OwnAmount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRankingRequest {
    pub address: String,
    pub role: AccountRole,
    pub field: TokenField,
    pub direction: Direction,
    pub platforms: Vec<Platform>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRanking {
    pub owner_label: &'static str,
    pub owner_name: String,
    pub profile_url: String,
    pub generated_at: String,
    pub title: &'static str,
    pub unit: &'static str,
    pub entries: Vec<RankingEntry>,
}

pub fn token_values(
    source: &dyn MarketSource,
    tokens: &[Token],
    field: TokenField,
    address: &str,
) -> Result<Vec<Option<SortValue>>, AppError> {
    let values = match field {
        TokenField::HighestSoldPrice => tokens
            .iter()
            .map(|token| token.highest_sold_price.map(SortValue::Int))
            .collect(),
        TokenField::RecentlySoldPrice => tokens
            .iter()
            .map(|token| token.recently_sold_price.map(SortValue::Int))
            .collect(),
        TokenField::LowestSoldPrice => {
            let mut values = Vec::with_capacity(tokens.len());
            for token in tokens {
                let records = source.token_records(&token.contract, token.token_id)?;
                values.push(lowest_sold_price(&records).map(SortValue::Int));
            }
            values
        }
        TokenField::AverageSoldPrice => {
            let mut values = Vec::with_capacity(tokens.len());
            for token in tokens {
                let records = source.token_records(&token.contract, token.token_id)?;
                values.push(average_sold_price(&records).map(SortValue::Float));
            }
            values
        }
        TokenField::MinSalePrice => tokens
            .iter()
            .map(|token| min_sale_price(token).map(SortValue::Int))
            .collect(),
        TokenField::Amount => tokens
            .iter()
            .map(|token| Some(SortValue::Int(token.amount)))
            .collect(),
        TokenField::CollectiblePrice => {
            let records = source.account_records(address, None)?;
            collectible_prices(tokens, &records, address)?
                .into_iter()
                .map(|value| Some(SortValue::Float(value)))
                .collect()
        }
        TokenField::OwnAmount => tokens
            .iter()
            .map(|token| own_amount(token, address).map(SortValue::Int))
            .collect(),
        TokenField::TokenId => tokens
            .iter()
            .map(|token| Some(SortValue::Int(token.token_id as i64)))
            .collect(),
        TokenField::Name => tokens
            .iter()
            .map(|token| token.name.clone().map(SortValue::Text))
            .collect(),
    };

    Ok(values)
}

pub fn rank_tokens(
    tokens: Vec<Token>,
    values: Vec<Option<SortValue>>,
    field: TokenField,
    direction: Direction,
    cfg: &ApiConfig,
) -> Vec<RankingEntry> {
    let sorted = sort_by_value(tokens.into_iter().zip(values).collect(), direction);

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, (token, value))| {
            let rank = index + 1;
            let platform = Platform::from_contract(&token.contract);
            let url = match platform {
                Some(platform) => format!(
                    "{}/{}/{}",
                    cfg.site_base,
                    platform.slug(),
                    token.token_id
                ),
                None => cfg.site_root(),
            };

            RankingEntry {
                rank,
                color: row_color(rank),
                id: token.token_id.to_string(),
                name: token.display_name().to_string(),
                platform: platform.map(Platform::display_name),
                url,
                photo: token.display_uri.as_deref().map(|uri| cfg.gateway_uri(uri)),
                option: format_value(field.unit(), value.as_ref()),
            }
        })
        .collect()
}

pub fn rank_account_tokens(
    source: &dyn MarketSource,
    req: &AccountRankingRequest,
    cfg: &ApiConfig,
    now: DateTime<Utc>,
) -> Result<TokenRanking, AppError> {
    let tokens = source.account_tokens(&req.address, req.role, &req.platforms)?;
    let owner_name = source.alias(&req.address).unwrap_or_else(|err| {
        warn!(
            component = "ranking",
            event = "ranking.alias_unavailable",
            address = %req.address,
            error = %err
        );
        req.address.clone()
    });

    let values = token_values(source, &tokens, req.field, &req.address)?;
    let entries = rank_tokens(tokens, values, req.field, req.direction, cfg);

    info!(
        component = "ranking",
        event = "ranking.tokens.built",
        role = req.role.target(),
        field = req.field.key(),
        entries = entries.len()
    );

    Ok(TokenRanking {
        owner_label: req.role.label(),
        owner_name,
        profile_url: cfg.profile_url(&req.address),
        generated_at: format_local(now),
        title: req.field.title(),
        unit: req.field.unit_label(),
        entries,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingField {
    GachaAmount,
    GachaTotal,
    GachaRate,
    XtzPerGacha,
    GachaItemAmount,
    CancelTime,
    GachaId,
    AuctionAmount,
    StartPrice,
    DirectPrice,
    CurrentBidPrice,
    CurrentStorePrice,
    RaisePercentage,
    DueTime,
    AuctionId,
    BundleAmount,
    BundleTotal,
    BundleRate,
    XtzPerBundle,
    BundleItemAmount,
    BundleId,
    IssueTime,
    Title,
}

pub struct ListingFieldDef {
    pub field: ListingField,
    pub key: &'static str,
    pub title: &'static str,
    pub unit: ValueUnit,
    pub kind: Option<ListingKind>,
}

const fn def(
    field: ListingField,
    key: &'static str,
    title: &'static str,
    unit: ValueUnit,
    kind: Option<ListingKind>,
) -> ListingFieldDef {
    ListingFieldDef {
        field,
        key,
        title,
        unit,
        kind,
    }
}

const GACHA: Option<ListingKind> = Some(ListingKind::Gacha);
const AUCTION: Option<ListingKind> = Some(ListingKind::Auction);
const BUNDLE: Option<ListingKind> = Some(ListingKind::Bundle);

pub static LISTING_FIELDS: [ListingFieldDef; 23] = [
    def(ListingField::GachaAmount, "gachaAmount", "Amount", ValueUnit::Amount, GACHA),
    def(ListingField::GachaTotal, "gachaTotal", "Total", ValueUnit::Amount, GACHA),
    def(ListingField::GachaRate, "gachaRate", "Rate", ValueUnit::Rate, GACHA),
    def(ListingField::XtzPerGacha, "xtzPerGacha", "Price", ValueUnit::Price, GACHA),
    def(ListingField::GachaItemAmount, "gachaItemAmount", "Item Amount", ValueUnit::Amount, GACHA),
    def(ListingField::CancelTime, "cancelTime", "Cancel Time", ValueUnit::Time, GACHA),
    def(ListingField::GachaId, "gachaId", "Gacha ID", ValueUnit::Plain, GACHA),
    def(ListingField::AuctionAmount, "auctionAmount", "Amount", ValueUnit::Amount, AUCTION),
    def(ListingField::StartPrice, "startPrice", "Start Price", ValueUnit::Price, AUCTION),
    def(ListingField::DirectPrice, "directPrice", "Direct Price", ValueUnit::Price, AUCTION),
    def(
        ListingField::CurrentBidPrice,
        "currentBidPrice",
        "Current Bid Price",
        ValueUnit::Price,
        AUCTION,
    ),
    def(
        ListingField::CurrentStorePrice,
        "currentStorePrice",
        "Current Store Price",
        ValueUnit::Price,
        AUCTION,
    ),
    def(
        ListingField::RaisePercentage,
        "raisePercentage",
        "Raise Percentage",
        ValueUnit::Rate,
        AUCTION,
    ),
    def(ListingField::DueTime, "dueTime", "Due Time", ValueUnit::Time, AUCTION),
    def(ListingField::AuctionId, "auctionId", "Auction ID", ValueUnit::Plain, AUCTION),
    def(ListingField::BundleAmount, "bundleAmount", "Amount", ValueUnit::Amount, BUNDLE),
    def(ListingField::BundleTotal, "bundleTotal", "Total", ValueUnit::Amount, BUNDLE),
    def(ListingField::BundleRate, "bundleRate", "Rate", ValueUnit::Rate, BUNDLE),
    def(ListingField::XtzPerBundle, "xtzPerBundle", "Price", ValueUnit::Price, BUNDLE),
    def(
        ListingField::BundleItemAmount,
        "bundleItemAmount",
        "Item Amount",
        ValueUnit::Amount,
        BUNDLE,
    ),
    def(ListingField::BundleId, "bundleId", "Bundle ID", ValueUnit::Plain, BUNDLE),
    def(ListingField::IssueTime, "issueTime", "Issue Time", ValueUnit::Time, None),
    def(ListingField::Title, "title", "Title", ValueUnit::Plain, None),
];

impl ListingField {
    pub fn parse(kind: ListingKind, raw: &str) -> Option<Self> {
        LISTING_FIELDS
            .iter()
            .find(|def| def.key == raw && def.kind.map_or(true, |owner| owner == kind))
            .map(|def| def.field)
    }

    pub fn fields_for(kind: ListingKind) -> impl Iterator<Item = &'static ListingFieldDef> {
        LISTING_FIELDS
            .iter()
            .filter(move |def| def.kind.map_or(true, |owner| owner == kind))
    }

    pub fn def(self) -> &'static ListingFieldDef {
        &LISTING_FIELDS[self as usize]
    }

    pub fn title(self) -> &'static str {
        self.def().title
    }

    pub fn unit(self) -> ValueUnit {
        self.def().unit
    }

    pub fn value(self, listing: &Listing) -> Option<SortValue> {
        match self {
            Self::GachaAmount | Self::AuctionAmount | Self::BundleAmount => {
                listing.amount.map(SortValue::Int)
            }
            Self::GachaTotal | Self::BundleTotal => listing.total.map(SortValue::Int),
            Self::GachaRate | Self::BundleRate => {
                fill_rate(listing.amount, listing.total).map(SortValue::Float)
            }
            Self::XtzPerGacha | Self::XtzPerBundle => listing.xtz_per_unit.map(SortValue::Int),
            Self::GachaItemAmount => listing.gacha_item_amount.map(SortValue::Int),
            Self::BundleItemAmount => Some(SortValue::Int(bundle_item_amount(listing))),
            Self::StartPrice => listing.start_price.map(SortValue::Int),
            Self::DirectPrice => listing.direct_price.map(SortValue::Int),
            Self::CurrentBidPrice => listing.current_bid_price.map(SortValue::Int),
            Self::CurrentStorePrice => listing.current_store_price.map(SortValue::Int),
            Self::RaisePercentage => listing.raise_percentage.map(SortValue::Float),
            Self::CancelTime => listing.cancel_time.map(SortValue::Time),
            Self::DueTime => listing.due_time.map(SortValue::Time),
            Self::IssueTime => listing.issue_time.map(SortValue::Time),
            Self::GachaId | Self::AuctionId | Self::BundleId => {
                Some(SortValue::Int(listing.id as i64))
            }
            Self::Title => listing.title.clone().map(SortValue::Text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRankingRequest {
    pub kind: ListingKind,
    pub field: ListingField,
    pub direction: Direction,
    pub exclude_expired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRanking {
    pub generated_at: String,
    pub title: &'static str,
    pub unit: &'static str,
    pub entries: Vec<RankingEntry>,
}

pub fn rank_listing_entries(
    listings: Vec<Listing>,
    kind: ListingKind,
    field: ListingField,
    direction: Direction,
    cfg: &ApiConfig,
) -> Vec<RankingEntry> {
    let keyed = listings
        .into_iter()
        .map(|listing| {
            let value = field.value(&listing);
            (listing, value)
        })
        .collect();

    sort_by_value(keyed, direction)
        .into_iter()
        .enumerate()
        .map(|(index, (listing, value))| {
            let rank = index + 1;
            RankingEntry {
                rank,
                color: row_color(rank),
                id: listing.id.to_string(),
                name: listing.title.clone().unwrap_or_default(),
                platform: None,
                url: format!(
                    "{}/{}/{}{}",
                    cfg.site_base,
                    kind.as_str(),
                    listing_version_segment(listing.contract.as_deref()),
                    listing.id
                ),
                photo: listing
                    .cover_token()
                    .and_then(|token| token.display_uri.as_deref())
                    .map(|uri| cfg.gateway_uri(uri)),
                option: format_value(field.unit(), value.as_ref()),
            }
        })
        .collect()
}

pub fn rank_listings(
    source: &dyn MarketSource,
    req: &ListingRankingRequest,
    cfg: &ApiConfig,
    now: DateTime<Utc>,
) -> Result<ListingRanking, AppError> {
    let mut listings = source.listings(req.kind)?;
    if req.exclude_expired {
        listings.retain(|listing| listing.cancel_time.map_or(true, |cancel| cancel >= now));
    }

    let entries = rank_listing_entries(listings, req.kind, req.field, req.direction, cfg);

    info!(
        component = "ranking",
        event = "ranking.listings.built",
        kind = req.kind.as_str(),
        field = req.field.def().key,
        entries = entries.len()
    );

    Ok(ListingRanking {
        generated_at: format_local(now),
        title: req.field.title(),
        unit: req.field.unit().label(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryMarketSource;
    use chrono::TimeZone;

    fn token(token_id: u64, amount: i64, name: Option<&str>) -> Token {
        serde_json::from_value(serde_json::json!({
            "contract": Platform::Akaobj.contract(),
            "tokenId": token_id,
            "amount": amount,
            "name": name,
            "displayUri": "ipfs://QmCover"
        }))
        .unwrap()
    }

    fn ids(entries: &[RankingEntry]) -> Vec<String> {
        entries.iter().map(|entry| entry.id.clone()).collect()
    }

    #[test]
    fn ranking_by_amount_ascending_orders_and_numbers_entries() {
        let tokens = vec![token(1, 10, Some("a")), token(2, 5, Some("b"))];
        let source = InMemoryMarketSource::new();
        let values = token_values(&source, &tokens, TokenField::Amount, "tz1me").unwrap();
        let entries = rank_tokens(
            tokens,
            values,
            TokenField::Amount,
            Direction::Ascending,
            &ApiConfig::default(),
        );

        assert_eq!(ids(&entries), vec!["2", "1"]);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].option.as_deref(), Some("5"));
        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[1].option.as_deref(), Some("10"));
        assert_eq!(entries[0].color, ROW_WHITE);
        assert_eq!(entries[1].color, ROW_GREY);
        assert_eq!(entries[0].url, "https://akaswap.com/akaobj/2");
        assert_eq!(entries[0].platform, Some("akaSwap"));
        assert_eq!(
            entries[0].photo.as_deref(),
            Some("https://ipfs.io/ipfs/QmCover")
        );
    }

    #[test]
    fn descending_reverses_valued_entries_and_keeps_missing_at_the_end() {
        let items = vec![
            ("a", Some(SortValue::Int(3))),
            ("none-1", None),
            ("b", Some(SortValue::Int(1))),
            ("c", Some(SortValue::Int(2))),
            ("none-2", None),
        ];

        let asc: Vec<_> = sort_by_value(items.clone(), Direction::Ascending)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        let desc: Vec<_> = sort_by_value(items, Direction::Descending)
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        assert_eq!(asc, vec!["b", "c", "a", "none-1", "none-2"]);
        assert_eq!(desc, vec!["a", "c", "b", "none-1", "none-2"]);
    }

    #[test]
    fn price_fields_format_in_xtz_and_blank_when_missing() {
        assert_eq!(
            format_value(ValueUnit::Price, Some(&SortValue::Int(3_000_000))),
            Some("3.00 xtz".to_string())
        );
        assert_eq!(
            format_value(ValueUnit::Price, Some(&SortValue::Float(2_500_000.0))),
            Some("2.50 xtz".to_string())
        );
        assert_eq!(format_value(ValueUnit::Price, None), Some(String::new()));
        assert_eq!(format_value(ValueUnit::Plain, Some(&SortValue::Int(4))), None);
        assert_eq!(
            format_value(ValueUnit::Rate, Some(&SortValue::Float(0.5))),
            Some("0.5".to_string())
        );
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap();
        assert_eq!(
            format_value(ValueUnit::Time, Some(&SortValue::Time(ts))),
            Some("2024-03-02 00:00:00".to_string())
        );
    }

    #[test]
    fn lowest_sold_price_fetches_each_token_feed() {
        let contract = Platform::Akaobj.contract();
        let sale = |price: i64| {
            serde_json::from_value(serde_json::json!({
                "type": "collect",
                "timestamp": "2024-01-01T00:00:00Z",
                "price": price,
                "amount": 1
            }))
            .unwrap()
        };
        let source = InMemoryMarketSource::new()
            .with_token_records(contract, 1, vec![sale(4_000_000), sale(2_000_000)])
            .with_token_records(contract, 2, vec![]);
        let tokens = vec![token(1, 1, None), token(2, 1, None)];

        let values = token_values(&source, &tokens, TokenField::LowestSoldPrice, "tz1").unwrap();
        assert_eq!(values, vec![Some(SortValue::Int(2_000_000)), None]);
        assert_eq!(
            source.calls(),
            vec![
                format!("token_records:{contract}/1"),
                format!("token_records:{contract}/2"),
            ]
        );
    }

    #[test]
    fn token_field_table_is_consistent() {
        for field in ALL_TOKEN_FIELDS {
            assert_eq!(TokenField::parse(field.key()), Some(field));
        }
        assert_eq!(TokenField::Amount.unit_label(), "Amount");
        assert_eq!(TokenField::Name.unit_label(), "Price");
        assert_eq!(TokenField::parse("bogus"), None);
    }

    #[test]
    fn listing_fields_are_scoped_to_their_kind() {
        assert_eq!(
            ListingField::parse(ListingKind::Gacha, "gachaRate"),
            Some(ListingField::GachaRate)
        );
        assert_eq!(ListingField::parse(ListingKind::Bundle, "gachaRate"), None);
        assert_eq!(
            ListingField::parse(ListingKind::Auction, "issueTime"),
            Some(ListingField::IssueTime)
        );
        assert_eq!(ListingField::fields_for(ListingKind::Gacha).count(), 9);
        assert_eq!(ListingField::fields_for(ListingKind::Auction).count(), 10);
        assert_eq!(ListingField::fields_for(ListingKind::Bundle).count(), 8);
        for (index, def) in LISTING_FIELDS.iter().enumerate() {
            assert_eq!(def.field as usize, index);
            assert_eq!(def.field.def().key, def.key);
        }
    }

    #[test]
    fn listing_ranking_by_rate_with_expired_filter() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let gacha = |id: u64, amount: i64, total: i64, cancel: &str| -> Listing {
            serde_json::from_value(serde_json::json!({
                "gachaId": id,
                "title": format!("gacha {id}"),
                "contract": "KT1NL8H5GTAWrVNbQUxxDzagRAURsdeV3Asz",
                "gachaAmount": amount,
                "gachaTotal": total,
                "cancelTime": cancel,
                "gachaItems": [{"amount": 1, "token": {"displayUri": "ipfs://QmG"}}]
            }))
            .unwrap()
        };
        let source = InMemoryMarketSource::new().with_listings(
            ListingKind::Gacha,
            vec![
                gacha(1, 1, 4, "2024-07-01T00:00:00Z"),
                gacha(2, 3, 4, "2024-05-01T00:00:00Z"),
                gacha(3, 2, 4, "2024-08-01T00:00:00Z"),
            ],
        );
        let req = ListingRankingRequest {
            kind: ListingKind::Gacha,
            field: ListingField::GachaRate,
            direction: Direction::Descending,
            exclude_expired: true,
        };

        let ranking = rank_listings(&source, &req, &ApiConfig::default(), now).unwrap();
        assert_eq!(ranking.title, "Rate");
        assert_eq!(ranking.unit, "Rate");
        assert_eq!(ids(&ranking.entries), vec!["3", "1"]);
        assert_eq!(ranking.entries[0].option.as_deref(), Some("0.5"));
        assert_eq!(ranking.entries[0].url, "https://akaswap.com/gacha/v1/3");
        assert_eq!(
            ranking.entries[0].photo.as_deref(),
            Some("https://ipfs.io/ipfs/QmG")
        );
    }

    #[test]
    fn collectible_ranking_reads_account_feed_once() {
        let contract = Platform::Akaobj.contract();
        let held = |token_id: u64| -> Token {
            serde_json::from_value(serde_json::json!({
                "contract": contract,
                "tokenId": token_id,
                "amount": 5,
                "owners": {"tz1me": 1}
            }))
            .unwrap()
        };
        let buy = |token_id: u64, price: i64| {
            serde_json::from_value(serde_json::json!({
                "type": "collect",
                "timestamp": "2024-01-01T00:00:00Z",
                "price": price,
                "amount": 1,
                "contract": contract,
                "tokenId": token_id
            }))
            .unwrap()
        };
        let source = InMemoryMarketSource::new()
            .with_account_tokens("tz1me", AccountRole::Collector, vec![held(1), held(2)])
            .with_account_records("tz1me", vec![buy(1, 1_000_000), buy(2, 4_000_000)])
            .with_alias("tz1me", "Me");
        let req = AccountRankingRequest {
            address: "tz1me".to_string(),
            role: AccountRole::Collector,
            field: TokenField::CollectiblePrice,
            direction: Direction::Descending,
            platforms: vec![Platform::Akaobj],
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let ranking = rank_account_tokens(&source, &req, &ApiConfig::default(), now).unwrap();
        assert_eq!(ranking.owner_label, "Collector");
        assert_eq!(ranking.owner_name, "Me");
        assert_eq!(ranking.unit, "Price");
        assert_eq!(ids(&ranking.entries), vec!["2", "1"]);
        assert_eq!(ranking.entries[0].option.as_deref(), Some("4.00 xtz"));
        assert_eq!(
            source
                .calls()
                .iter()
                .filter(|call| call.starts_with("account_records"))
                .count(),
            1
        );
    }
}
