//! services/api/src/bin/api.rs

use paper_api::{
    adapters::{CognitoAdapter, HttpJwksSource, LopdfCombiner, PgPaperRegistry, S3Adapter},
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use question_paper_core::{
    Catalogue, PaperAssembler, PaperLibrary, StorageLayout, TokenVerifier,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!(environment = %config.environment, "Configuration loaded. Starting server...");

    // --- 2. Connect to the Paper Registry ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let registry = Arc::new(PgPaperRegistry::new(db_pool, config.papers_table.clone()));
    registry.ensure_schema().await?;
    info!(table = %config.papers_table, "Paper registry ready.");

    // --- 3. Initialize Service Adapters ---
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let storage = Arc::new(S3Adapter::new(aws_sdk_s3::Client::new(&aws_config)));

    let pool_region = config
        .user_pool_region()
        .ok_or_else(|| ApiError::Internal("USER_POOL_ID has no region prefix".to_string()))?
        .to_string();
    let cognito_config = aws_sdk_cognitoidentityprovider::config::Builder::from(&aws_config)
        .region(aws_sdk_cognitoidentityprovider::config::Region::new(pool_region))
        .build();
    let credentials = Arc::new(CognitoAdapter::new(
        aws_sdk_cognitoidentityprovider::Client::from_conf(cognito_config),
        config.user_pool_id.clone(),
        config.user_pool_client_id.clone(),
    ));
    let signing_keys = Arc::new(HttpJwksSource::new(config.jwks_url.clone())?);

    // --- 4. Build the Core Services and the Shared AppState ---
    let layout = StorageLayout {
        question_bucket: config.question_bucket.clone(),
        generated_bucket: config.generated_bucket.clone(),
        question_suffix: config.question_suffix.clone(),
        link_ttl: config.link_ttl,
    };
    let app_state = Arc::new(AppState {
        credentials,
        verifier: Arc::new(TokenVerifier::new(
            signing_keys,
            config.user_pool_client_id.clone(),
        )),
        catalogue: Arc::new(Catalogue::new(storage.clone(), config.question_bucket.clone())),
        assembler: Arc::new(PaperAssembler::new(
            storage.clone(),
            Arc::new(LopdfCombiner),
            registry.clone(),
            storage.clone(),
            layout,
        )),
        library: Arc::new(PaperLibrary::new(
            registry,
            storage,
            config.generated_bucket.clone(),
            config.link_ttl,
        )),
    });

    // --- 5. Create the Web Router ---
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
    let cors = match &config.cors_allowed_origin {
        Some(origin) => cors.allow_origin(origin.parse::<HeaderValue>().map_err(|e| {
            ApiError::Internal(format!("Invalid CORS_ALLOWED_ORIGIN '{}': {}", origin, e))
        })?),
        None => cors.allow_origin(Any),
    };

    // Merge the API router with the Swagger UI router for a complete application.
    let app = web::router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
