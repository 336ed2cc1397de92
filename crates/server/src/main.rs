use axum::Router;
use database::db::connect;
use log::{error, info, warn};
use migration::{Migrator, MigratorTrait};
use server::{
    AppState, api_router, config::Config, public_router, tasks::spawn_expiration_task,
    utils::shutdown::shutdown_signal,
};
use std::process;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_oauth2_resource_server::server::OAuth2ResourceServer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    if let Err(e) = run().await {
        error!("{e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let db = connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;
    info!("Database migrations applied");

    spawn_expiration_task(db.clone(), config.expiration_days, config.expiration_interval);

    let state = AppState::new(db, config.clone());
    let (api_routes, api) = api_router(state.clone());

    let api_routes = match &config.oidc_issuer_url {
        Some(issuer_url) => {
            let oauth2_resource_server = <OAuth2ResourceServer>::builder()
                .issuer_url(issuer_url.as_str())
                .build()
                .await
                .map_err(|e| format!("Failed to build OAuth2ResourceServer: {e:?}"))?;
            api_routes.layer(ServiceBuilder::new().layer(oauth2_resource_server.into_layer()))
        }
        None => {
            warn!("OIDC_ISSUER_URL is not set; every authenticated endpoint will answer 401");
            api_routes
        }
    };

    let app = Router::new()
        .merge(api_routes)
        .merge(public_router(state, api))
        .layer(ServiceBuilder::new().layer(CompressionLayer::new()));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Running axum on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
