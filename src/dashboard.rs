//! HTTP routes: form parsing, validation and dispatch to the shaping layer.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Form, Router,
};
use chrono::{Days, NaiveDate, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::aggregate::PLATFORM_TZ;
use crate::catalog::{AccountRole, Action, Category, ListingKind, Platform};
use crate::config::ApiConfig;
use crate::error::AppError;
use crate::history::build_history;
use crate::ranking::{
    rank_account_tokens, rank_listings, AccountRankingRequest, Direction, ListingField,
    ListingRankingRequest, TokenField,
};
use crate::records::{record_report, QueryWindow, RecordQuery};
use crate::render::{
    render_account_ranking, render_history, render_home, render_listing_ranking,
    render_ranking_index, render_records, Flash,
};
use crate::source::MarketSource;

const FORM_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_RECORD_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("No {0}")]
    Missing(&'static str),
    #[error("Invalid {0}")]
    Invalid(&'static str),
}

pub type FormFields = Vec<(String, String)>;

fn first<'a>(fields: &'a [(String, String)], key: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn all<'a>(fields: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .collect()
}

fn parse_platforms(fields: &[(String, String)]) -> Result<Vec<Platform>, FormError> {
    let platforms: Vec<Platform> = all(fields, "platform")
        .into_iter()
        .filter_map(Platform::from_slug)
        .collect();
    if platforms.is_empty() {
        return Err(FormError::Missing("Platform"));
    }
    Ok(platforms)
}

fn parse_direction(fields: &[(String, String)]) -> Result<Direction, FormError> {
    first(fields, "direction")
        .and_then(Direction::parse)
        .ok_or(FormError::Missing("Reverse Option"))
}

pub fn parse_account_ranking(
    role: AccountRole,
    fields: &[(String, String)],
) -> Result<AccountRankingRequest, FormError> {
    let address = first(fields, "address").ok_or(FormError::Missing(role.label()))?;
    let field = first(fields, "option")
        .and_then(TokenField::parse)
        .filter(|field| role == AccountRole::Collector || !field.collection_only())
        .ok_or(FormError::Missing("Ranking Attribute"))?;
    let direction = parse_direction(fields)?;
    let platforms = parse_platforms(fields)?;

    Ok(AccountRankingRequest {
        address: address.to_string(),
        role,
        field,
        direction,
        platforms,
    })
}

pub fn parse_listing_ranking(
    kind: ListingKind,
    fields: &[(String, String)],
) -> Result<ListingRankingRequest, FormError> {
    let field = first(fields, "option")
        .and_then(|raw| ListingField::parse(kind, raw))
        .ok_or(FormError::Missing("Ranking Attribute"))?;
    let exclude_expired = if kind == ListingKind::Gacha {
        match first(fields, "exclude_expired") {
            Some("true") => true,
            Some("false") => false,
            _ => return Err(FormError::Missing("Filter Option")),
        }
    } else {
        false
    };
    let direction = parse_direction(fields)?;

    Ok(ListingRankingRequest {
        kind,
        field,
        direction,
        exclude_expired,
    })
}

pub fn parse_history(fields: &[(String, String)]) -> Result<(u64, Platform), FormError> {
    let raw_id = first(fields, "token_id").ok_or(FormError::Missing("Token"))?;
    let platform = first(fields, "platform")
        .and_then(Platform::from_slug)
        .ok_or(FormError::Missing("Platform"))?;
    let token_id = raw_id
        .parse::<u64>()
        .map_err(|_| FormError::Invalid("Token ID"))?;
    Ok((token_id, platform))
}

pub fn parse_record_query(fields: &[(String, String)]) -> Result<RecordQuery, FormError> {
    let address = first(fields, "address").ok_or(FormError::Missing("User"))?;
    let raw_start = first(fields, "start_date").ok_or(FormError::Missing("Start Time"))?;
    let raw_end = first(fields, "end_date").ok_or(FormError::Missing("End Time"))?;

    let start_date = NaiveDate::parse_from_str(raw_start, FORM_DATE_FORMAT)
        .map_err(|_| FormError::Invalid("Date"))?;
    let end_date = NaiveDate::parse_from_str(raw_end, FORM_DATE_FORMAT)
        .map_err(|_| FormError::Invalid("Date"))?;
    if start_date > end_date {
        return Err(FormError::Invalid("Date"));
    }
    let window =
        QueryWindow::from_dates(start_date, end_date).ok_or(FormError::Invalid("Date"))?;

    let platforms = parse_platforms(fields)?;
    let categories: Vec<Category> = all(fields, "category")
        .into_iter()
        .filter_map(Category::parse)
        .collect();
    if categories.is_empty() {
        return Err(FormError::Missing("Type"));
    }
    let actions: Vec<Action> = all(fields, "action")
        .into_iter()
        .filter_map(Action::parse)
        .collect();
    if actions.is_empty() {
        return Err(FormError::Missing("Action"));
    }

    Ok(RecordQuery {
        address: address.to_string(),
        platforms,
        categories,
        actions,
        start_date,
        end_date,
        window,
    })
}

pub fn default_record_dates() -> (String, String) {
    let today = Utc::now().with_timezone(&PLATFORM_TZ).date_naive();
    let start = today
        .checked_sub_days(Days::new(DEFAULT_RECORD_DAYS))
        .unwrap_or(today);
    (
        start.format(FORM_DATE_FORMAT).to_string(),
        today.format(FORM_DATE_FORMAT).to_string(),
    )
}

#[derive(Clone)]
struct AppState {
    source: Arc<dyn MarketSource>,
    api: Arc<ApiConfig>,
}

pub const DASHBOARD_ROUTES: [&str; 9] = [
    "/",
    "/ranking",
    "/ranking/creation",
    "/ranking/collection",
    "/ranking/gacha",
    "/ranking/auction",
    "/ranking/bundle",
    "/history",
    "/record",
];

pub fn dashboard_router(source: Arc<dyn MarketSource>, api: ApiConfig) -> Router {
    Router::new()
        .route("/", get(get_home))
        .route("/ranking", get(get_ranking_index))
        .route(
            "/ranking/creation",
            get(get_creation_ranking).post(post_creation_ranking),
        )
        .route(
            "/ranking/collection",
            get(get_collection_ranking).post(post_collection_ranking),
        )
        .route(
            "/ranking/gacha",
            get(get_gacha_ranking).post(post_gacha_ranking),
        )
        .route(
            "/ranking/auction",
            get(get_auction_ranking).post(post_auction_ranking),
        )
        .route(
            "/ranking/bundle",
            get(get_bundle_ranking).post(post_bundle_ranking),
        )
        .route("/history", get(get_history).post(post_history))
        .route("/record", get(get_record).post(post_record))
        .with_state(AppState {
            source,
            api: Arc::new(api),
        })
}

// Runs upstream work off the async executor; the client blocks.
async fn run_blocking<T, F>(state: &AppState, job: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&dyn MarketSource, &ApiConfig) -> Result<T, AppError> + Send + 'static,
{
    let source = Arc::clone(&state.source);
    let api = Arc::clone(&state.api);
    tokio::task::spawn_blocking(move || job(source.as_ref(), api.as_ref()))
        .await
        .map_err(|err| AppError::Worker(err.to_string()))?
}

fn failed(page: &'static str, err: &AppError) -> Vec<Flash> {
    warn!(
        component = "http",
        event = "http.request.failed",
        page,
        error = %err
    );
    vec![Flash::danger(err.to_string())]
}

async fn get_home() -> impl IntoResponse {
    Html(render_home())
}

async fn get_ranking_index() -> impl IntoResponse {
    Html(render_ranking_index())
}

async fn account_ranking(state: AppState, role: AccountRole, fields: FormFields) -> Html<String> {
    info!(
        component = "http",
        event = "http.ranking.request",
        page = role.target()
    );
    let req = match parse_account_ranking(role, &fields) {
        Ok(req) => req,
        Err(err) => {
            return Html(render_account_ranking(role, &[Flash::danger(err.to_string())], None))
        }
    };

    match run_blocking(&state, move |source, api| {
        rank_account_tokens(source, &req, api, Utc::now())
    })
    .await
    {
        Ok(ranking) => Html(render_account_ranking(role, &[], Some(&ranking))),
        Err(err) => Html(render_account_ranking(role, &failed(role.target(), &err), None)),
    }
}

async fn listing_ranking(state: AppState, kind: ListingKind, fields: FormFields) -> Html<String> {
    info!(
        component = "http",
        event = "http.ranking.request",
        page = kind.as_str()
    );
    let req = match parse_listing_ranking(kind, &fields) {
        Ok(req) => req,
        Err(err) => {
            return Html(render_listing_ranking(kind, &[Flash::danger(err.to_string())], None))
        }
    };

    match run_blocking(&state, move |source, api| {
        rank_listings(source, &req, api, Utc::now())
    })
    .await
    {
        Ok(ranking) => Html(render_listing_ranking(kind, &[], Some(&ranking))),
        Err(err) => Html(render_listing_ranking(kind, &failed(kind.as_str(), &err), None)),
    }
}

async fn get_creation_ranking() -> impl IntoResponse {
    Html(render_account_ranking(AccountRole::Creator, &[], None))
}

async fn post_creation_ranking(
    State(state): State<AppState>,
    Form(fields): Form<FormFields>,
) -> impl IntoResponse {
    account_ranking(state, AccountRole::Creator, fields).await
}

async fn get_collection_ranking() -> impl IntoResponse {
    Html(render_account_ranking(AccountRole::Collector, &[], None))
}

async fn post_collection_ranking(
    State(state): State<AppState>,
    Form(fields): Form<FormFields>,
) -> impl IntoResponse {
    account_ranking(state, AccountRole::Collector, fields).await
}

async fn get_gacha_ranking() -> impl IntoResponse {
    Html(render_listing_ranking(ListingKind::Gacha, &[], None))
}

async fn post_gacha_ranking(
    State(state): State<AppState>,
    Form(fields): Form<FormFields>,
) -> impl IntoResponse {
    listing_ranking(state, ListingKind::Gacha, fields).await
}

async fn get_auction_ranking() -> impl IntoResponse {
    Html(render_listing_ranking(ListingKind::Auction, &[], None))
}

async fn post_auction_ranking(
    State(state): State<AppState>,
    Form(fields): Form<FormFields>,
) -> impl IntoResponse {
    listing_ranking(state, ListingKind::Auction, fields).await
}

async fn get_bundle_ranking() -> impl IntoResponse {
    Html(render_listing_ranking(ListingKind::Bundle, &[], None))
}

async fn post_bundle_ranking(
    State(state): State<AppState>,
    Form(fields): Form<FormFields>,
) -> impl IntoResponse {
    listing_ranking(state, ListingKind::Bundle, fields).await
}

async fn get_history() -> impl IntoResponse {
    Html(render_history(&[], None))
}

async fn post_history(
    State(state): State<AppState>,
    Form(fields): Form<FormFields>,
) -> impl IntoResponse {
    info!(component = "http", event = "http.history.request");
    let (token_id, platform) = match parse_history(&fields) {
        Ok(parsed) => parsed,
        Err(err) => return Html(render_history(&[Flash::danger(err.to_string())], None)),
    };

    match run_blocking(&state, move |source, api| {
        build_history(source, token_id, platform, api, Utc::now())
    })
    .await
    {
        Ok(history) => {
            let flashes: Vec<Flash> = history
                .warnings
                .iter()
                .map(|warning| Flash::warning(warning.message()))
                .collect();
            Html(render_history(&flashes, Some(&history)))
        }
        Err(err) => Html(render_history(&failed("history", &err), None)),
    }
}

async fn get_record() -> impl IntoResponse {
    let (start, end) = default_record_dates();
    Html(render_records(&start, &end, &[], None))
}

async fn post_record(
    State(state): State<AppState>,
    Form(fields): Form<FormFields>,
) -> impl IntoResponse {
    info!(component = "http", event = "http.record.request");
    let (start, end) = default_record_dates();
    let query = match parse_record_query(&fields) {
        Ok(query) => query,
        Err(err) => {
            return Html(render_records(
                &start,
                &end,
                &[Flash::danger(err.to_string())],
                None,
            ))
        }
    };

    match run_blocking(&state, move |source, api| {
        record_report(source, &query, api, Utc::now())
    })
    .await
    {
        Ok(Some(report)) => Html(render_records(&start, &end, &[], Some(&report))),
        Ok(None) => Html(render_records(
            &start,
            &end,
            &[Flash::danger("No Record")],
            None,
        )),
        Err(err) => Html(render_records(&start, &end, &failed("record", &err), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn account_form_checks_fields_in_order() {
        let err = parse_account_ranking(AccountRole::Creator, &form(&[("option", "amount")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "No Creator");

        let err = parse_account_ranking(
            AccountRole::Collector,
            &form(&[("address", "tz1a"), ("direction", "asc")]),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "No Ranking Attribute");

        let err = parse_account_ranking(
            AccountRole::Collector,
            &form(&[("address", "tz1a"), ("option", "amount")]),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "No Reverse Option");

        let err = parse_account_ranking(
            AccountRole::Collector,
            &form(&[("address", "tz1a"), ("option", "amount"), ("direction", "desc")]),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "No Platform");
    }

    #[test]
    fn creator_cannot_rank_by_holding_fields() {
        let err = parse_account_ranking(
            AccountRole::Creator,
            &form(&[
                ("address", "tz1a"),
                ("option", "ownAmount"),
                ("direction", "desc"),
                ("platform", "akaobj"),
            ]),
        )
        .unwrap_err();
        assert_eq!(err, FormError::Missing("Ranking Attribute"));
    }

    #[test]
    fn repeated_platforms_are_collected() {
        let req = parse_account_ranking(
            AccountRole::Collector,
            &form(&[
                ("address", " tz1a "),
                ("option", "collectiblePrice"),
                ("direction", "desc"),
                ("platform", "akaobj"),
                ("platform", "bogus"),
                ("platform", "td-guardian"),
            ]),
        )
        .unwrap();
        assert_eq!(req.address, "tz1a");
        assert_eq!(req.platforms, vec![Platform::Akaobj, Platform::TdGuardian]);
        assert_eq!(req.direction, Direction::Descending);
    }

    #[test]
    fn gacha_form_requires_expiry_choice_before_direction() {
        let err = parse_listing_ranking(
            ListingKind::Gacha,
            &form(&[("option", "gachaRate"), ("direction", "asc")]),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "No Filter Option");

        let req = parse_listing_ranking(
            ListingKind::Auction,
            &form(&[("option", "dueTime"), ("direction", "asc")]),
        )
        .unwrap();
        assert_eq!(req.field, ListingField::DueTime);
        assert!(!req.exclude_expired);
    }

    #[test]
    fn history_form_rejects_non_numeric_ids() {
        assert_eq!(
            parse_history(&form(&[("platform", "akaobj")])).unwrap_err(),
            FormError::Missing("Token")
        );
        assert_eq!(
            parse_history(&form(&[("token_id", "12")])).unwrap_err(),
            FormError::Missing("Platform")
        );
        assert_eq!(
            parse_history(&form(&[("token_id", "abc"), ("platform", "akaobj")]))
                .unwrap_err()
                .to_string(),
            "Invalid Token ID"
        );
        assert_eq!(
            parse_history(&form(&[("token_id", "12"), ("platform", "asmeir")])).unwrap(),
            (12, Platform::Asmeir)
        );
    }

    #[test]
    fn record_form_validates_dates_and_selections() {
        let base = [
            ("address", "tz1a"),
            ("start_date", "2024-01-01"),
            ("end_date", "2024-01-01"),
        ];
        assert_eq!(
            parse_record_query(&form(&base)).unwrap_err().to_string(),
            "No Platform"
        );

        let mut pairs = base.to_vec();
        pairs.push(("platform", "akaobj"));
        assert_eq!(
            parse_record_query(&form(&pairs)).unwrap_err().to_string(),
            "No Type"
        );
        pairs.push(("category", "gacha"));
        assert_eq!(
            parse_record_query(&form(&pairs)).unwrap_err().to_string(),
            "No Action"
        );
        pairs.push(("action", "collect"));
        let query = parse_record_query(&form(&pairs)).unwrap();
        assert_eq!(query.categories, vec![Category::Gacha]);
        assert_eq!(query.window.start_param(), "2023-12-31T16:00:00Z");

        let err = parse_record_query(&form(&[
            ("address", "tz1a"),
            ("start_date", "2024-02-01"),
            ("end_date", "2024-01-01"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid Date");

        let err = parse_record_query(&form(&[("address", "tz1a"), ("end_date", "2024-01-01")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "No Start Time");
    }
}
