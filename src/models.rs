//! Upstream payload types (akaSwap v2 API and the tzkt account lookup).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub contract: String,
    pub token_id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_uri: Option<String>,
    #[serde(default)]
    pub amount: i64,
    #[serde(
        default,
        deserialize_with = "owners_in_order",
        serialize_with = "owners_as_map"
    )]
    pub owners: Vec<(String, i64)>,
    #[serde(default)]
    pub owner_aliases: Option<BTreeMap<String, Option<String>>>,
    #[serde(default)]
    pub sale: Option<Sale>,
    #[serde(default)]
    pub highest_sold_price: Option<i64>,
    #[serde(default)]
    pub recently_sold_price: Option<i64>,
}

impl Token {
    pub fn swaps(&self) -> &[Swap] {
        self.sale
            .as_ref()
            .map(|sale| sale.swaps.as_slice())
            .unwrap_or(&[])
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

// Owners arrive as a JSON object; keep the upstream key order.
fn owners_in_order<'de, D>(deserializer: D) -> Result<Vec<(String, i64)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OwnersVisitor;

    impl<'de> Visitor<'de> for OwnersVisitor {
        type Value = Vec<(String, i64)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of owner address to amount")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut owners = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, i64>()? {
                owners.push(entry);
            }
            Ok(owners)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(OwnersVisitor)
}

fn owners_as_map<S>(owners: &[(String, i64)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(owners.iter().map(|(address, amount)| (address, amount)))
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sale {
    #[serde(default)]
    pub swaps: Vec<Swap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swap {
    pub xtz_per_token: i64,
}

// Unknown record type strings are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    Mint,
    Sell,
    Burn,
    Transfer,
    Collect,
    Swap,
    CancelSwap,
    MakeOffer,
    SellOffer,
    CollectOffer,
    MakeGacha,
    SellGacha,
    CollectGacha,
    MakeAuction,
    SellAuction,
    CollectAuction,
    MakeBundle,
    SellBundle,
    CollectBundle,
    Other(String),
}

const KNOWN_RECORD_TYPES: [RecordType; 19] = [
    RecordType::Mint,
    RecordType::Sell,
    RecordType::Burn,
    RecordType::Transfer,
    RecordType::Collect,
    RecordType::Swap,
    RecordType::CancelSwap,
    RecordType::MakeOffer,
    RecordType::SellOffer,
    RecordType::CollectOffer,
    RecordType::MakeGacha,
    RecordType::SellGacha,
    RecordType::CollectGacha,
    RecordType::MakeAuction,
    RecordType::SellAuction,
    RecordType::CollectAuction,
    RecordType::MakeBundle,
    RecordType::SellBundle,
    RecordType::CollectBundle,
];

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Mint => "mint",
            Self::Sell => "sell",
            Self::Burn => "burn",
            Self::Transfer => "transfer",
            Self::Collect => "collect",
            Self::Swap => "swap",
            Self::CancelSwap => "cancel_swap",
            Self::MakeOffer => "make_offer",
            Self::SellOffer => "sell_offer",
            Self::CollectOffer => "collect_offer",
            Self::MakeGacha => "make_gacha",
            Self::SellGacha => "sell_gacha",
            Self::CollectGacha => "collect_gacha",
            Self::MakeAuction => "make_auction",
            Self::SellAuction => "sell_auction",
            Self::CollectAuction => "collect_auction",
            Self::MakeBundle => "make_bundle",
            Self::SellBundle => "sell_bundle",
            Self::CollectBundle => "collect_bundle",
            Self::Other(raw) => raw,
        }
    }

    pub fn prefix(&self) -> &str {
        let raw = self.as_str();
        raw.split('_').next().unwrap_or(raw)
    }

    pub fn is_completed_sale(&self) -> bool {
        matches!(self, Self::Collect | Self::CollectOffer)
    }

    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl From<String> for RecordType {
    fn from(raw: String) -> Self {
        KNOWN_RECORD_TYPES
            .iter()
            .find(|known| known.as_str() == raw)
            .cloned()
            .unwrap_or(Self::Other(raw))
    }
}

impl From<RecordType> for String {
    fn from(record_type: RecordType) -> Self {
        record_type.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(rename = "type")]
    pub kind: RecordType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from_alias: Option<String>,
    #[serde(default)]
    pub to_alias: Option<String>,
    #[serde(default)]
    pub contract: Option<String>,
    #[serde(default)]
    pub token_id: Option<u64>,
    #[serde(default)]
    pub token_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFeed {
    #[serde(default)]
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(alias = "gachaId", alias = "auctionId", alias = "bundleId")]
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub contract: Option<String>,
    #[serde(
        default,
        alias = "gachaAmount",
        alias = "auctionAmount",
        alias = "bundleAmount"
    )]
    pub amount: Option<i64>,
    #[serde(default, alias = "gachaTotal", alias = "bundleTotal")]
    pub total: Option<i64>,
    #[serde(default, alias = "xtzPerGacha", alias = "xtzPerBundle")]
    pub xtz_per_unit: Option<i64>,
    #[serde(default)]
    pub gacha_item_amount: Option<i64>,
    #[serde(default)]
    pub start_price: Option<i64>,
    #[serde(default)]
    pub direct_price: Option<i64>,
    #[serde(default)]
    pub current_bid_price: Option<i64>,
    #[serde(default)]
    pub current_store_price: Option<i64>,
    #[serde(default)]
    pub raise_percentage: Option<f64>,
    #[serde(default)]
    pub issue_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancel_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_time: Option<DateTime<Utc>>,
    #[serde(default, alias = "gachaItems", alias = "bundleItems")]
    pub items: Vec<ListingItem>,
    #[serde(default)]
    pub token: Option<TokenRef>,
}

impl Listing {
    pub fn cover_token(&self) -> Option<&TokenRef> {
        self.token
            .as_ref()
            .or_else(|| self.items.first().and_then(|item| item.token.as_ref()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingItem {
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub token: Option<TokenRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRef {
    #[serde(default)]
    pub display_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub alias: Option<String>,
}
