#![cfg(feature = "live-akaswap-tests")]

use akaboard::{AkaswapClient, ApiConfig, ListingKind, MarketSource, Platform};

fn live_client() -> AkaswapClient {
    let cfg = ApiConfig {
        http_timeout_ms: Some(30_000),
        ..ApiConfig::default()
    };
    AkaswapClient::new(cfg).expect("blocking client should build")
}

#[test]
fn live_listings_paginate_to_the_reported_count() {
    let client = live_client();
    for kind in [ListingKind::Gacha, ListingKind::Auction, ListingKind::Bundle] {
        match client.listings(kind) {
            Ok(listings) => assert!(!listings.is_empty()),
            Err(err) => assert_eq!(err.to_string(), format!("Non-existent {}", kind.label())),
        }
    }
}

#[test]
fn live_token_lookup_and_record_feed() {
    let client = live_client();
    let contract = Platform::Akaobj.contract();
    let token = client.token(contract, 1).expect("akaSwap token #1 should exist");
    assert_eq!(token.token_id, 1);

    let records = client
        .token_records(contract, 1)
        .expect("record feed should decode");
    assert!(records.windows(2).all(|pair| pair[0].timestamp >= pair[1].timestamp));
}
