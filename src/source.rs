//! The seam between the shaping logic and the marketplace API.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::catalog::{AccountRole, ListingKind, Platform};
use crate::error::AppError;
use crate::models::{Listing, Record, Token};
use crate::records::QueryWindow;

/// Read-only view of the upstream marketplace. Every call is blocking and is
/// issued by the caller one after another.
pub trait MarketSource: Send + Sync + 'static {
    fn token(&self, contract: &str, token_id: u64) -> Result<Token, AppError>;

    fn token_records(&self, contract: &str, token_id: u64) -> Result<Vec<Record>, AppError>;

    fn account_tokens(
        &self,
        address: &str,
        role: AccountRole,
        platforms: &[Platform],
    ) -> Result<Vec<Token>, AppError>;

    fn account_records(
        &self,
        address: &str,
        window: Option<&QueryWindow>,
    ) -> Result<Vec<Record>, AppError>;

    fn listings(&self, kind: ListingKind) -> Result<Vec<Listing>, AppError>;

    fn alias(&self, address: &str) -> Result<String, AppError>;
}

#[derive(Default)]
pub struct InMemoryMarketSource {
    tokens: Vec<Token>,
    token_records: HashMap<(String, u64), Vec<Record>>,
    account_tokens: HashMap<(String, AccountRole), Vec<Token>>,
    account_records: HashMap<String, Vec<Record>>,
    listings: HashMap<ListingKind, Vec<Listing>>,
    aliases: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryMarketSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.tokens.push(token);
        self
    }

    pub fn with_token_records(
        mut self,
        contract: &str,
        token_id: u64,
        records: Vec<Record>,
    ) -> Self {
        self.token_records
            .insert((contract.to_string(), token_id), records);
        self
    }

    pub fn with_account_tokens(
        mut self,
        address: &str,
        role: AccountRole,
        tokens: Vec<Token>,
    ) -> Self {
        self.account_tokens
            .insert((address.to_string(), role), tokens);
        self
    }

    pub fn with_account_records(mut self, address: &str, records: Vec<Record>) -> Self {
        self.account_records.insert(address.to_string(), records);
        self
    }

    pub fn with_listings(mut self, kind: ListingKind, listings: Vec<Listing>) -> Self {
        self.listings.insert(kind, listings);
        self
    }

    pub fn with_alias(mut self, address: &str, alias: &str) -> Self {
        self.aliases.insert(address.to_string(), alias.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("call log lock should not be poisoned")
            .clone()
    }

    fn note(&self, call: String) {
        self.calls
            .lock()
            .expect("call log lock should not be poisoned")
            .push(call);
    }
}

impl MarketSource for InMemoryMarketSource {
    fn token(&self, contract: &str, token_id: u64) -> Result<Token, AppError> {
        self.note(format!("token:{contract}/{token_id}"));
        self.tokens
            .iter()
            .find(|token| token.contract == contract && token.token_id == token_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Token"))
    }

    fn token_records(&self, contract: &str, token_id: u64) -> Result<Vec<Record>, AppError> {
        self.note(format!("token_records:{contract}/{token_id}"));
        Ok(self
            .token_records
            .get(&(contract.to_string(), token_id))
            .cloned()
            .unwrap_or_default())
    }

    fn account_tokens(
        &self,
        address: &str,
        role: AccountRole,
        platforms: &[Platform],
    ) -> Result<Vec<Token>, AppError> {
        self.note(format!("account_tokens:{address}/{}", role.target()));
        let held = self
            .account_tokens
            .get(&(address.to_string(), role))
            .ok_or_else(|| AppError::not_found(role.label()))?;

        let mut tokens = Vec::new();
        for platform in platforms {
            tokens.extend(
                held.iter()
                    .filter(|token| token.contract == platform.contract())
                    .cloned(),
            );
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
        self.note(format!("account_records:{address}"));
        let records = self.account_records.get(address).cloned().unwrap_or_default();
        Ok(match window {
            Some(window) => records
                .into_iter()
                .filter(|record| window.contains(record.timestamp))
                .collect(),
            None => records,
        })
    }

    fn listings(&self, kind: ListingKind) -> Result<Vec<Listing>, AppError> {
        self.note(format!("listings:{}", kind.plural()));
        match self.listings.get(&kind) {
            Some(listings) if !listings.is_empty() => Ok(listings.clone()),
            _ => Err(AppError::not_found(kind.label())),
        }
    }

    fn alias(&self, address: &str) -> Result<String, AppError> {
        self.note(format!("alias:{address}"));
        Ok(self
            .aliases
            .get(address)
            .cloned()
            .unwrap_or_else(|| address.to_string()))
    }
}
