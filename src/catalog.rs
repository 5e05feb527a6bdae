//! Fixed lookup tables: platforms and their contracts, record categories,
//! action prefixes and listing kinds.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::RecordType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Akaobj,
    Asmeir,
    TezDozen,
    TdGuardian,
    Hicetnunc,
}

pub const ALL_PLATFORMS: [Platform; 5] = [
    Platform::Akaobj,
    Platform::Asmeir,
    Platform::TezDozen,
    Platform::TdGuardian,
    Platform::Hicetnunc,
];

impl Platform {
    pub fn slug(self) -> &'static str {
        match self {
            Self::Akaobj => "akaobj",
            Self::Asmeir => "asmeir",
            Self::TezDozen => "tezdozen",
            Self::TdGuardian => "td-guardian",
            Self::Hicetnunc => "hicetnunc",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Akaobj => "akaSwap",
            Self::Asmeir => "ASMeiR",
            Self::TezDozen => "Tez Dozen",
            Self::TdGuardian => "TD-Guardian",
            Self::Hicetnunc => "Hicetnunc",
        }
    }

    pub fn contract(self) -> &'static str {
        match self {
            Self::Akaobj => "KT1AFq5XorPduoYyWxs5gEyrFK6fVjJVbtCj",
            Self::Asmeir => "KT1VTBuWpY5f4sEdCHVWRSn99yUS5HqVWVk2",
            Self::TezDozen => "KT1Xphnv7A1sUgRwZsecmAGFWm7WNxJz76ax",
            Self::TdGuardian => "KT1ShjqosdcqJBhaabPvkCwoXtS1R2dEbx4W",
            Self::Hicetnunc => "KT1RJ6PbjHpwc3M5rw5s2Nbmefwbuwbdxton",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        ALL_PLATFORMS
            .iter()
            .copied()
            .find(|platform| platform.slug() == slug)
    }

    pub fn from_contract(contract: &str) -> Option<Self> {
        contract_index().get(contract).copied()
    }
}

fn contract_index() -> &'static HashMap<&'static str, Platform> {
    static INDEX: OnceLock<HashMap<&'static str, Platform>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let index: HashMap<_, _> = ALL_PLATFORMS
            .iter()
            .map(|platform| (platform.contract(), *platform))
            .collect();
        assert_eq!(
            index.len(),
            ALL_PLATFORMS.len(),
            "platform contracts must be unique"
        );
        index
    })
}

pub fn platform_name(contract: Option<&str>) -> &'static str {
    contract
        .and_then(Platform::from_contract)
        .map(Platform::display_name)
        .unwrap_or("")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    General,
    Gacha,
    Auction,
    Bundle,
}

pub const ALL_CATEGORIES: [Category; 4] = [
    Category::General,
    Category::Gacha,
    Category::Auction,
    Category::Bundle,
];

impl Category {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "general" => Some(Self::General),
            "gacha" => Some(Self::Gacha),
            "auction" => Some(Self::Auction),
            "bundle" => Some(Self::Bundle),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Gacha => "gacha",
            Self::Auction => "auction",
            Self::Bundle => "bundle",
        }
    }

    pub fn record_types(self) -> &'static [RecordType] {
        match self {
            Self::General => &[
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
            ],
            Self::Gacha => &[
                RecordType::MakeGacha,
                RecordType::SellGacha,
                RecordType::CollectGacha,
            ],
            Self::Auction => &[
                RecordType::MakeAuction,
                RecordType::SellAuction,
                RecordType::CollectAuction,
            ],
            Self::Bundle => &[
                RecordType::MakeBundle,
                RecordType::SellBundle,
                RecordType::CollectBundle,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Mint,
    Make,
    Sell,
    Burn,
    Transfer,
    Collect,
    Swap,
    Cancel,
}

pub const ALL_ACTIONS: [Action; 8] = [
    Action::Mint,
    Action::Make,
    Action::Sell,
    Action::Burn,
    Action::Transfer,
    Action::Collect,
    Action::Swap,
    Action::Cancel,
];

impl Action {
    pub fn parse(raw: &str) -> Option<Self> {
        ALL_ACTIONS
            .iter()
            .copied()
            .find(|action| action.as_str() == raw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::Make => "make",
            Self::Sell => "sell",
            Self::Burn => "burn",
            Self::Transfer => "transfer",
            Self::Collect => "collect",
            Self::Swap => "swap",
            Self::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingKind {
    Gacha,
    Auction,
    Bundle,
}

impl ListingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gacha => "gacha",
            Self::Auction => "auction",
            Self::Bundle => "bundle",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Gacha => "Gacha",
            Self::Auction => "Auction",
            Self::Bundle => "Bundle",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Self::Gacha => "gachas",
            Self::Auction => "auctions",
            Self::Bundle => "bundles",
        }
    }

    pub fn page_size(self) -> usize {
        match self {
            Self::Auction => 30,
            Self::Gacha | Self::Bundle => 20,
        }
    }
}

pub fn listing_version_segment(contract: Option<&str>) -> &'static str {
    match contract {
        Some("KT1NL8H5GTAWrVNbQUxxDzagRAURsdeV3Asz") => "v1/",
        Some("KT1GsdckBVCsgqp6ERYLnyawyXACAAQspPv6") => "v2/",
        _ => "",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountRole {
    Creator,
    Collector,
}

impl AccountRole {
    pub fn label(self) -> &'static str {
        match self {
            Self::Creator => "Creator",
            Self::Collector => "Collector",
        }
    }

    pub fn target(self) -> &'static str {
        match self {
            Self::Creator => "creation",
            Self::Collector => "collection",
        }
    }

    pub fn target_label(self) -> &'static str {
        match self {
            Self::Creator => "Creation",
            Self::Collector => "Collection",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_lookup_round_trips_every_platform() {
        for platform in ALL_PLATFORMS {
            assert_eq!(Platform::from_contract(platform.contract()), Some(platform));
            assert_eq!(Platform::from_slug(platform.slug()), Some(platform));
        }
    }

    #[test]
    fn unknown_contract_degrades_to_empty_name() {
        assert_eq!(platform_name(Some("KT1unknown")), "");
        assert_eq!(platform_name(None), "");
        assert_eq!(
            platform_name(Some("KT1RJ6PbjHpwc3M5rw5s2Nbmefwbuwbdxton")),
            "Hicetnunc"
        );
    }

    #[test]
    fn category_tables_match_their_suffix() {
        for kind in [Category::Gacha, Category::Auction, Category::Bundle] {
            let types = kind.record_types();
            assert_eq!(types.len(), 3);
            assert!(types
                .iter()
                .all(|record_type| record_type.as_str().ends_with(kind.as_str())));
        }
        assert_eq!(Category::General.record_types().len(), 10);
    }

    #[test]
    fn listing_versions_follow_legacy_contracts() {
        assert_eq!(
            listing_version_segment(Some("KT1NL8H5GTAWrVNbQUxxDzagRAURsdeV3Asz")),
            "v1/"
        );
        assert_eq!(
            listing_version_segment(Some("KT1GsdckBVCsgqp6ERYLnyawyXACAAQspPv6")),
            "v2/"
        );
        assert_eq!(listing_version_segment(None), "");
    }
}
