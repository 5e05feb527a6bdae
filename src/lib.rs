//! akaboard: ranking, price-history and record dashboard over the akaSwap
//! marketplace API.
//!
//! - `client`: blocking upstream fetcher with count-driven pagination
//! - `aggregate`, `ranking`, `records`, `history`: data shaping
//! - `dashboard`, `render`: axum routes and server-rendered pages

mod aggregate;
mod catalog;
mod client;
mod config;
mod dashboard;
mod error;
mod history;
mod models;
mod observability;
mod ranking;
mod records;
mod render;
mod source;

pub use aggregate::{
    average_sold_price, bundle_item_amount, collectible_prices, completed_sale_prices,
    fill_rate, format_local, format_xtz, lowest_sold_price, min_sale_price, own_amount, round2,
    MUTEZ_PER_XTZ, PLATFORM_TZ,
};
pub use catalog::{
    listing_version_segment, platform_name, AccountRole, Action, Category, ListingKind,
    Platform, ALL_ACTIONS, ALL_CATEGORIES, ALL_PLATFORMS,
};
pub use client::{
    fetch_paginated, get_json, AkaswapClient, HttpFetcher, HttpReply, ReqwestBlockingFetcher,
};
pub use config::{
    api_config_from_env, logging_config_from_env, server_config_from_env, ApiConfig,
    ConfigError, LogFormat, LoggingConfig, ServerConfig,
};
pub use dashboard::{
    dashboard_router, default_record_dates, parse_account_ranking, parse_history,
    parse_listing_ranking, parse_record_query, FormError, FormFields, DASHBOARD_ROUTES,
};
pub use error::AppError;
pub use history::{
    build_history, owner_breakdown, price_points, summarize, HistorySummary, HistoryWarning,
    PriceHistory, PriceHistoryPoint,
};
pub use models::{
    AccountInfo, Listing, ListingItem, Record, RecordFeed, RecordType, Sale, Swap, Token,
    TokenRef,
};
pub use observability::{
    build_filter, filter_directive, init_logging, log_app_bind, log_app_start,
    log_upstream_selected, LoggingInitError,
};
pub use ranking::{
    format_value, rank_account_tokens, rank_listing_entries, rank_listings, rank_tokens,
    row_color, sort_by_value, token_values, AccountRankingRequest, Direction, ListingField,
    ListingFieldDef, ListingRanking, ListingRankingRequest, RankingEntry, SortValue,
    TokenField, TokenRanking, ValueUnit, ALL_TOKEN_FIELDS, LISTING_FIELDS,
};
pub use records::{
    allowed_record_types, filter_account_records, filter_records, format_record,
    record_report, truncate_address, FormattedRecord, QueryWindow, RecordQuery, RecordReport,
};
pub use render::{escape_html, Flash, FlashLevel};
pub use source::{InMemoryMarketSource, MarketSource};
