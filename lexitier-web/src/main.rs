use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use lexitier::mt::{GoogleTranslateProvider, RestContributionStore, TranslatorGateway};
use lexitier::{
    DictionaryEntry, Lexicon, OverlayCache, OverlayState, ResolutionResult, Resolver,
    ResolverConfig, load_dictionary_from_file,
};

#[derive(Serialize, Deserialize)]
pub struct ResolveRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub dictionary_entries: usize,
    pub overlay: Option<OverlayState>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ResolverConfig::from_env()?;
    let dict_path =
        std::env::var("LEXITIER_DICTIONARY").unwrap_or_else(|_| "data/vi-tyz.json".to_string());
    let dictionary = load_dictionary_from_file(std::path::Path::new(&dict_path))
        .map_err(|e| format!("Failed to load dictionary: {}", e))?;
    info!("📖 Loaded {} entries from {}", dictionary.len(), dict_path);

    let mut resolver = Resolver::new(Arc::new(dictionary)).with_config(&config);

    let store = match RestContributionStore::from_env() {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!("Contribution overlay disabled: {}", e);
            None
        }
    };
    if let Some(store) = &store {
        resolver = resolver.with_overlay(Arc::new(OverlayCache::from_config(
            store.clone(),
            &config,
        )));
    }

    match GoogleTranslateProvider::from_env() {
        Ok(provider) => {
            let mut gateway = TranslatorGateway::new(
                Arc::new(provider),
                &config.source_locale,
                &config.target_locale,
            )?;
            if let Some(store) = store {
                gateway = gateway.with_store(store);
            }
            resolver = resolver.with_gateway(Arc::new(gateway));
        }
        Err(e) => warn!("Translation gateway disabled: {}", e),
    }

    let state = AppState {
        resolver: Arc::new(resolver),
    };

    let bind = std::env::var("LEXITIER_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("🚀 Server running at http://{}", bind);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/resolve", post(resolve_text))
        .route("/api/lookup/{word}", get(lookup_word))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        dictionary_entries: state.resolver.dictionary().len(),
        overlay: state.resolver.overlay().map(|cache| cache.state()),
    })
}

async fn resolve_text(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolutionResult>, ApiError> {
    if request.text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "text must not be empty".to_string(),
            }),
        ));
    }

    let result = state.resolver.resolve(&request.text).await;
    info!(
        "Resolved '{}': {} direct, {} inferred, {} unresolved",
        &request.text,
        result.direct_matches.len(),
        result.inferred_matches.len(),
        result.unresolved.len()
    );

    Ok(Json(result))
}

async fn lookup_word(
    State(state): State<AppState>,
    Path(word): Path<String>,
) -> Result<Json<DictionaryEntry>, ApiError> {
    state.resolver.lookup(&word).await.map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no entry for '{}'", word),
            }),
        )
    })
}
