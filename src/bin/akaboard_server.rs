use std::sync::Arc;

use akaboard::{
    dashboard_router, init_logging, log_app_bind, log_app_start, log_upstream_selected,
    logging_config_from_env, server_config_from_env, AkaswapClient, MarketSource,
};

// The blocking HTTP client must be built and dropped outside the async runtime.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;

    let server_cfg = server_config_from_env()?;
    log_app_start(&logging_cfg, &server_cfg.api);
    let client = AkaswapClient::new(server_cfg.api.clone())?;
    log_upstream_selected(&server_cfg.api);
    let source: Arc<dyn MarketSource> = Arc::new(client);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let app_source = Arc::clone(&source);
    runtime.block_on(async move {
        let app = dashboard_router(app_source, server_cfg.api);
        let listener = tokio::net::TcpListener::bind(server_cfg.bind_addr).await?;
        let bound_addr = listener.local_addr()?;

        log_app_bind(bound_addr);
        axum::serve(listener, app).await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    drop(source);
    Ok(())
}
