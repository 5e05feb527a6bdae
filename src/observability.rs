//! Subscriber installation and the server lifecycle events.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ApiConfig, LogFormat, LoggingConfig};
use crate::dashboard::DASHBOARD_ROUTES;

// Connection-level chatter from the HTTP stack drowns the upstream.* events.
const QUIET_DEPENDENCIES: [&str; 3] = ["hyper_util=warn", "reqwest=warn", "rustls=warn"];

#[derive(Debug, Error)]
pub enum LoggingInitError {
    #[error("invalid AKABOARD_LOG_LEVEL '{directive}': {message}")]
    InvalidFilter { directive: String, message: String },
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub fn filter_directive(config: &LoggingConfig) -> String {
    let mut directive = config.filter.clone();
    for quiet in QUIET_DEPENDENCIES {
        let (crate_name, _) = quiet.split_once('=').unwrap_or((quiet, ""));
        if !directive.contains(crate_name) {
            directive.push(',');
            directive.push_str(quiet);
        }
    }
    directive
}

pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingInitError> {
    let directive = filter_directive(config);
    EnvFilter::try_new(&directive).map_err(|err| LoggingInitError::InvalidFilter {
        directive: config.filter.clone(),
        message: err.to_string(),
    })
}

pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(config)?)
        .with_target(config.include_target);

    match config.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.json().with_ansi(false).finish())?
        }
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }

    Ok(())
}

pub fn log_app_start(logging: &LoggingConfig, api: &ApiConfig) {
    info!(
        component = "akaboard_server",
        event = "app.start",
        log_filter = %logging.filter,
        log_format = logging.format.as_str(),
        site_base = %api.site_base,
        ipfs_gateway = %api.ipfs_gateway
    );
}

pub fn log_upstream_selected(api: &ApiConfig) {
    info!(
        component = "akaboard_server",
        event = "upstream.selected",
        api_base = %api.api_base,
        site_api_base = %api.site_api_base,
        tzkt_api_base = %api.tzkt_api_base,
        http_timeout_ms = ?api.http_timeout_ms
    );
}

pub fn log_app_bind(bound_addr: SocketAddr) {
    info!(
        component = "akaboard_server",
        event = "app.bind",
        bind_addr = %bound_addr,
        url = %format!("http://{bound_addr}/"),
        routes = %DASHBOARD_ROUTES.join(" ")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging(filter: &str) -> LoggingConfig {
        LoggingConfig {
            filter: filter.to_string(),
            ..LoggingConfig::default()
        }
    }

    #[test]
    fn plain_level_gets_http_stack_quieted() {
        assert_eq!(
            filter_directive(&logging("debug")),
            "debug,hyper_util=warn,reqwest=warn,rustls=warn"
        );
    }

    #[test]
    fn explicit_dependency_directive_is_left_alone() {
        assert_eq!(
            filter_directive(&logging("info,reqwest=trace")),
            "info,reqwest=trace,hyper_util=warn,rustls=warn"
        );
    }

    #[test]
    fn unparseable_filter_is_reported_with_the_raw_value() {
        let err = build_filter(&logging("akaboard=loud")).unwrap_err();
        match &err {
            LoggingInitError::InvalidFilter { directive, .. } => {
                assert_eq!(directive, "akaboard=loud")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("invalid AKABOARD_LOG_LEVEL 'akaboard=loud'"));
    }
}
