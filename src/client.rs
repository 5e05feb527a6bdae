//! Blocking akaSwap / tzkt client with count-driven pagination.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::{AccountRole, ListingKind, Platform};
use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::{AccountInfo, Listing, Record, RecordFeed, Token};
use crate::records::QueryWindow;
use crate::source::MarketSource;

const ACCOUNT_PAGE_SIZE: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait HttpFetcher: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpReply, AppError>;
}

pub struct ReqwestBlockingFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestBlockingFetcher {
    pub fn new(timeout_ms: Option<u64>) -> Result<Self, AppError> {
        let builder = reqwest::blocking::Client::builder();
        let builder = match timeout_ms {
            Some(ms) => builder.timeout(std::time::Duration::from_millis(ms)),
            None => builder.timeout(None),
        };
        let client = builder
            .build()
            .map_err(|err| AppError::HttpClientBuild(err.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpFetcher for ReqwestBlockingFetcher {
    fn get(&self, url: &str) -> Result<HttpReply, AppError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| AppError::Upstream {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|err| AppError::Upstream {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        Ok(HttpReply { status, body })
    }
}

pub fn get_json<T: DeserializeOwned>(
    fetcher: &dyn HttpFetcher,
    url: &str,
    noun: &str,
) -> Result<T, AppError> {
    debug!(component = "client", event = "upstream.request", url);
    let reply = fetcher.get(url).inspect_err(|err| {
        warn!(
            component = "client",
            event = "upstream.error",
            url,
            error = %err
        );
    })?;

    if !reply.is_success() {
        warn!(
            component = "client",
            event = "upstream.error",
            url,
            status = reply.status
        );
        return Err(AppError::not_found(noun));
    }

    serde_json::from_slice(&reply.body).map_err(|err| AppError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })
}

/// Walks `limit`/`offset` pages until the reported `count` is covered. A page
/// reporting `count == 0` ends the walk.
pub fn fetch_paginated<T: DeserializeOwned>(
    fetcher: &dyn HttpFetcher,
    page_size: usize,
    items_key: &str,
    noun: &str,
    url_for_offset: impl Fn(usize) -> String,
) -> Result<Vec<T>, AppError> {
    let page_size = page_size.max(1);
    let mut items = Vec::new();
    let mut offset = 0usize;

    loop {
        let url = url_for_offset(offset);
        let page: Value = get_json(fetcher, &url, noun)?;
        let count = page.get("count").and_then(Value::as_u64).unwrap_or(0) as usize;
        if count == 0 {
            break;
        }

        let batch = page
            .get(items_key)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        let mut batch: Vec<T> =
            serde_json::from_value(batch).map_err(|err| AppError::Decode {
                url: url.clone(),
                message: err.to_string(),
            })?;

        debug!(
            component = "client",
            event = "upstream.page",
            items_key,
            offset,
            count,
            fetched = batch.len()
        );
        items.append(&mut batch);

        offset += page_size;
        if offset >= count {
            break;
        }
    }

    Ok(items)
}

pub struct AkaswapClient {
    cfg: ApiConfig,
    fetcher: Box<dyn HttpFetcher>,
}

impl AkaswapClient {
    pub fn new(cfg: ApiConfig) -> Result<Self, AppError> {
        let fetcher = ReqwestBlockingFetcher::new(cfg.http_timeout_ms)?;
        Ok(Self::with_fetcher(cfg, fetcher))
    }

    pub fn with_fetcher(cfg: ApiConfig, fetcher: impl HttpFetcher + 'static) -> Self {
        Self {
            cfg,
            fetcher: Box::new(fetcher),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.cfg
    }
}

impl MarketSource for AkaswapClient {
    fn token(&self, contract: &str, token_id: u64) -> Result<Token, AppError> {
        let url = format!("{}/v2/fa2tokens/{contract}/{token_id}", self.cfg.api_base);
        get_json(self.fetcher.as_ref(), &url, "Token")
    }

    fn token_records(&self, contract: &str, token_id: u64) -> Result<Vec<Record>, AppError> {
        let url = format!(
            "{}/v2/fa2tokens/{contract}/{token_id}/records",
            self.cfg.site_api_base
        );
        let feed: RecordFeed = get_json(self.fetcher.as_ref(), &url, "Token")?;
        Ok(feed.records)
    }

    fn account_tokens(
        &self,
        address: &str,
        role: AccountRole,
        platforms: &[Platform],
    ) -> Result<Vec<Token>, AppError> {
        let mut tokens = Vec::new();
        for platform in platforms {
            let mut page: Vec<Token> = fetch_paginated(
                self.fetcher.as_ref(),
                ACCOUNT_PAGE_SIZE,
                "tokens",
                role.label(),
                |offset| {
                    format!(
                        "{}/v2/accounts/{address}/{}s?limit={ACCOUNT_PAGE_SIZE}&offset={offset}&contracts={}",
                        self.cfg.site_api_base,
                        role.target(),
                        platform.contract()
                    )
                },
            )?;
            tokens.append(&mut page);
        }

        if tokens.is_empty() {
            return Err(AppError::not_found(role.target_label()));
        }
        Ok(tokens)
    }

    fn account_records(
        &self,
        address: &str,
        window: Option<&QueryWindow>,
    ) -> Result<Vec<Record>, AppError> {
        let mut url = format!("{}/v2/accounts/{address}/records", self.cfg.api_base);
        if let Some(window) = window {
            url.push_str(&format!(
                "?startTime={}&endTime={}",
                window.start_param(),
                window.end_param()
            ));
        }
        let feed: RecordFeed = get_json(self.fetcher.as_ref(), &url, "User")?;
        Ok(feed.records)
    }

    fn listings(&self, kind: ListingKind) -> Result<Vec<Listing>, AppError> {
        let page_size = kind.page_size();
        let listings: Vec<Listing> = fetch_paginated(
            self.fetcher.as_ref(),
            page_size,
            kind.plural(),
            kind.label(),
            |offset| {
                format!(
                    "{}/v2/{}?limit={page_size}&offset={offset}",
                    self.cfg.api_base,
                    kind.plural()
                )
            },
        )?;

        if listings.is_empty() {
            return Err(AppError::not_found(kind.label()));
        }
        Ok(listings)
    }

    fn alias(&self, address: &str) -> Result<String, AppError> {
        let url = format!("{}/v1/accounts/{address}", self.cfg.tzkt_api_base);
        let info: AccountInfo = get_json(self.fetcher.as_ref(), &url, "User")?;
        Ok(info
            .alias
            .filter(|alias| !alias.is_empty())
            .unwrap_or_else(|| address.to_string()))
    }
}
